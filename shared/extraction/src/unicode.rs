//! Unicode Normalizer
//! 
//! Canonicalizes header and cell text before any comparison: typographic
//! quotes, dashes and ellipses become ASCII, exotic spaces become plain
//! spaces, invisible characters are dropped, decomposed accents are
//! recomposed (NFC) and whitespace runs collapse to one space.

use unicode_normalization::UnicodeNormalization;

/// Canonical display text. Idempotent.
pub fn normalize_text(input: &str) -> String {
    let mut mapped = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => mapped.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' => {
                mapped.push('"')
            }
            '\u{2010}'..='\u{2015}' | '\u{2212}' => mapped.push('-'),
            '\u{2026}' => mapped.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{3000}' => mapped.push(' '),
            // zero-width characters and soft hyphen
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => {}
            other => mapped.push(other),
        }
    }

    let composed: String = mapped.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case key with punctuation folded to spaces, used for every
/// header, synonym and keyword comparison.
pub fn comparison_key(input: &str) -> String {
    let lowered = normalize_text(input).to_lowercase();
    let folded: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word containment on comparison keys.
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() || haystack.is_empty() {
        return false;
    }
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
