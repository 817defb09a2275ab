//! Header Field Mapper
//! 
//! Assigns table columns to canonical fields. Every header is scored
//! against every field: exact label 1.0, synonym 0.95, substring
//! containment in either direction 0.7, otherwise normalized Levenshtein
//! similarity. A field
//! takes its best column when the score clears the threshold; each header
//! text serves at most one field.

use dealsight_models::{CanonicalField, FieldMapping, FieldMatch, MatchKind};
use dealsight_utils::ExtractionConfig;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::unicode::comparison_key;

pub const EXACT_SCORE: f64 = 1.0;
pub const SYNONYM_SCORE: f64 = 0.95;
pub const CONTAINMENT_SCORE: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct HeaderMapper {
    /// Comparison keys per field, canonical label first
    vocabulary: BTreeMap<CanonicalField, FieldVocabulary>,
    threshold: f64,
}

#[derive(Debug, Clone)]
struct FieldVocabulary {
    label: String,
    synonyms: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    field: CanonicalField,
    column: usize,
    score: f64,
    kind: MatchKind,
}

impl HeaderMapper {
    pub fn new(config: &ExtractionConfig) -> Self {
        let vocabulary = CanonicalField::ALL
            .iter()
            .map(|field| {
                let synonyms = config
                    .header_synonyms
                    .get(field)
                    .map(|words| {
                        words
                            .iter()
                            .map(|w| comparison_key(w))
                            .filter(|w| !w.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
                (
                    *field,
                    FieldVocabulary {
                        label: comparison_key(field.label()),
                        synonyms,
                    },
                )
            })
            .collect();

        Self {
            vocabulary,
            threshold: config.mapping_threshold,
        }
    }

    /// Score of `header` for `field`, with how it matched.
    pub fn score(&self, field: CanonicalField, header: &str) -> (f64, MatchKind) {
        let key = comparison_key(header);
        match self.vocabulary.get(&field) {
            Some(vocabulary) if !key.is_empty() => vocabulary.score(&key),
            _ => (0.0, MatchKind::Similarity),
        }
    }

    pub fn map_headers(&self, headers: &[String]) -> FieldMapping {
        let mut candidates = Vec::new();
        for (column, header) in headers.iter().enumerate() {
            for field in CanonicalField::ALL {
                let (score, kind) = self.score(field, header);
                if score > self.threshold {
                    candidates.push(Candidate { field, column, score, kind });
                }
            }
        }

        // Highest score first; ties go to the earlier column, then field order
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.column.cmp(&b.column))
                .then(a.field.cmp(&b.field))
        });

        let mut mapping = FieldMapping::new();
        let mut claimed_keys = BTreeSet::new();
        for candidate in candidates {
            // Merged headers repeat their text; the repeated columns belong
            // to whichever field took the first one
            let key = comparison_key(&headers[candidate.column]);
            if mapping.is_mapped(candidate.field) || claimed_keys.contains(&key) {
                continue;
            }
            claimed_keys.insert(key);
            debug!(
                "Mapped header '{}' to {} ({:?}, {:.2})",
                headers[candidate.column], candidate.field, candidate.kind, candidate.score
            );
            mapping.insert(
                candidate.field,
                FieldMatch {
                    header: headers[candidate.column].clone(),
                    column: candidate.column,
                    confidence: candidate.score,
                    kind: candidate.kind,
                },
            );
        }

        mapping
    }
}

impl FieldVocabulary {
    fn score(&self, key: &str) -> (f64, MatchKind) {
        if key == self.label {
            return (EXACT_SCORE, MatchKind::Exact);
        }
        if self.synonyms.iter().any(|s| s == key) {
            return (SYNONYM_SCORE, MatchKind::Synonym);
        }

        let contained = self
            .terms()
            .any(|term| key.contains(term) || term.contains(key));
        if contained {
            return (CONTAINMENT_SCORE, MatchKind::Substring);
        }

        let similarity = self
            .terms()
            .map(|term| strsim::normalized_levenshtein(key, term))
            .fold(0.0, f64::max);
        (similarity, MatchKind::Similarity)
    }

    fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.label.as_str()).chain(self.synonyms.iter().map(|s| s.as_str()))
    }
}
