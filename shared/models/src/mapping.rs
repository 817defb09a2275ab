//! Header-to-field mapping models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical semantic fields an inventory table can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Application,
    Vendor,
    Category,
    UserCount,
    Complexity,
    Deployment,
    IntegrationCount,
    SsoRequired,
    DataVolume,
    CustomInterfaces,
    ParentHosted,
    Entity,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Application,
        CanonicalField::Vendor,
        CanonicalField::Category,
        CanonicalField::UserCount,
        CanonicalField::Complexity,
        CanonicalField::Deployment,
        CanonicalField::IntegrationCount,
        CanonicalField::SsoRequired,
        CanonicalField::DataVolume,
        CanonicalField::CustomInterfaces,
        CanonicalField::ParentHosted,
        CanonicalField::Entity,
    ];

    /// Canonical header wording; an exact match against it scores 1.0
    pub fn label(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Vendor => "vendor",
            Self::Category => "category",
            Self::UserCount => "user count",
            Self::Complexity => "complexity",
            Self::Deployment => "deployment type",
            Self::IntegrationCount => "integration count",
            Self::SsoRequired => "sso required",
            Self::DataVolume => "data volume",
            Self::CustomInterfaces => "custom interfaces",
            Self::ParentHosted => "parent hosted",
            Self::Entity => "entity",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How a header was matched to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Synonym,
    Substring,
    Similarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// Header text as it appears in the normalized table
    pub header: String,
    pub column: usize,
    pub confidence: f64,
    pub kind: MatchKind,
}

/// Mapping of canonical fields to table columns, built once per table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    matches: BTreeMap<CanonicalField, FieldMatch>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: CanonicalField, field_match: FieldMatch) {
        self.matches.insert(field, field_match);
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldMatch> {
        self.matches.get(&field)
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.matches.get(&field).map(|m| m.column)
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.matches.contains_key(&field)
    }

    pub fn mapped_count(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalField, &FieldMatch)> {
        self.matches.iter()
    }

    pub fn unmapped(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .iter()
            .copied()
            .filter(|f| !self.matches.contains_key(f))
            .collect()
    }

    /// Mean confidence across mapped fields; `None` when nothing mapped.
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.matches.is_empty() {
            return None;
        }
        let total: f64 = self.matches.values().map(|m| m.confidence).sum();
        Some(total / self.matches.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_confidence() {
        let mut mapping = FieldMapping::new();
        assert_eq!(mapping.mean_confidence(), None);

        mapping.insert(
            CanonicalField::Application,
            FieldMatch { header: "App".into(), column: 0, confidence: 0.95, kind: MatchKind::Synonym },
        );
        mapping.insert(
            CanonicalField::Vendor,
            FieldMatch { header: "Vendor".into(), column: 1, confidence: 1.0, kind: MatchKind::Exact },
        );

        let mean = mapping.mean_confidence().unwrap();
        assert!((mean - 0.975).abs() < 1e-9);
        assert_eq!(mapping.column(CanonicalField::Vendor), Some(1));
        assert_eq!(mapping.unmapped().len(), CanonicalField::ALL.len() - 2);
    }
}
