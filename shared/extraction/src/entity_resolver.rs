//! Entity Resolver
//! 
//! Decides which party a table belongs to. Signals, strongest first:
//! 
//! 1. An entity column: the table is tagged `PerRow` and must be split
//! 2. Keywords in the surrounding section text (high confidence)
//! 3. Keywords in the filename (low confidence)
//! 
//! Disagreeing signals raise `DealsightError::Ambiguity`. No signal at all
//! yields `EntityTag::Unresolved`, never a default.

use dealsight_models::{
    CanonicalField, Entity, EntityResolution, EntitySignal, EntityTag, FieldMapping, NormalizedTable,
    SignalSource, SignalStrength,
};
use dealsight_utils::{DealsightError, DealsightResult, EntityKeywords};
use std::collections::BTreeMap;
use tracing::debug;

use crate::unicode::{comparison_key, contains_words};

pub const SECTION_CONFIDENCE: f64 = 0.9;
pub const FILENAME_CONFIDENCE: f64 = 0.5;
pub const CORROBORATED_CONFIDENCE: f64 = 0.95;
pub const ENTITY_COLUMN_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct EntityResolver {
    target_keywords: Vec<String>,
    acquirer_keywords: Vec<String>,
}

impl EntityResolver {
    pub fn new(keywords: &EntityKeywords) -> Self {
        let keys = |words: &[String]| -> Vec<String> {
            words
                .iter()
                .map(|w| comparison_key(w))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            target_keywords: keys(&keywords.target),
            acquirer_keywords: keys(&keywords.acquirer),
        }
    }

    pub fn resolve(&self, table: &NormalizedTable, mapping: &FieldMapping) -> DealsightResult<EntityResolution> {
        if let Some(column) = self.entity_column(table, mapping) {
            debug!("Table {} carries entity column {}", table.id(), column);
            return Ok(EntityResolution {
                tag: EntityTag::PerRow { column },
                confidence: ENTITY_COLUMN_CONFIDENCE,
                signals: Vec::new(),
            });
        }

        let source = table.source();
        let section = source
            .section_context
            .as_deref()
            .map(|text| self.text_signal(text, SignalSource::SectionContext, SignalStrength::High))
            .transpose()?
            .flatten();
        let filename = source
            .filename
            .as_deref()
            .map(|name| self.text_signal(name, SignalSource::Filename, SignalStrength::Low))
            .transpose()?
            .flatten();

        let resolution = match (section, filename) {
            (Some(s), Some(f)) if s.entity != f.entity => {
                return Err(DealsightError::ambiguity(
                    "table entity",
                    vec![s.to_string(), f.to_string()],
                ));
            }
            (Some(s), Some(f)) => EntityResolution::resolved(s.entity, CORROBORATED_CONFIDENCE, vec![s, f]),
            (Some(s), None) => EntityResolution::resolved(s.entity, SECTION_CONFIDENCE, vec![s]),
            (None, Some(f)) => EntityResolution::resolved(f.entity, FILENAME_CONFIDENCE, vec![f]),
            (None, None) => EntityResolution::unresolved(),
        };
        Ok(resolution)
    }

    /// Column mapped to the entity field, provided at least one of its
    /// cells names a party.
    pub fn entity_column(&self, table: &NormalizedTable, mapping: &FieldMapping) -> Option<usize> {
        let column = mapping.column(CanonicalField::Entity)?;
        (0..table.row_count())
            .any(|row| self.entity_for_value(table.cell(row, column)).is_some())
            .then_some(column)
    }

    /// Party named by a cell value; `None` when it names neither or both.
    pub fn entity_for_value(&self, value: &str) -> Option<Entity> {
        let key = comparison_key(value);
        if let Ok(entity) = key.parse::<Entity>() {
            return Some(entity);
        }
        match (self.mentions(&key, Entity::Target), self.mentions(&key, Entity::Acquirer)) {
            (Some(_), None) => Some(Entity::Target),
            (None, Some(_)) => Some(Entity::Acquirer),
            _ => None,
        }
    }

    /// One table per party, entity column removed. Every row must name a
    /// party.
    pub fn split_by_entity(
        &self,
        table: &NormalizedTable,
        column: usize,
    ) -> DealsightResult<BTreeMap<Entity, NormalizedTable>> {
        table
            .partition_by_column(column, |cell| self.entity_for_value(cell))
            .map_err(|rows| {
                let listed: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                DealsightError::validation(
                    "entity",
                    format!(
                        "rows [{}] of table {} do not name a recognisable entity",
                        listed.join(", "),
                        table.id()
                    ),
                )
            })
    }

    fn text_signal(
        &self,
        text: &str,
        source: SignalSource,
        strength: SignalStrength,
    ) -> DealsightResult<Option<EntitySignal>> {
        let key = comparison_key(text);
        let signal = |entity: Entity, evidence: &str| EntitySignal {
            source,
            entity,
            strength,
            evidence: evidence.to_string(),
        };

        match (self.mentions(&key, Entity::Target), self.mentions(&key, Entity::Acquirer)) {
            (Some(target), Some(acquirer)) => Err(DealsightError::ambiguity(
                "table entity",
                vec![
                    signal(Entity::Target, target).to_string(),
                    signal(Entity::Acquirer, acquirer).to_string(),
                ],
            )),
            (Some(target), None) => Ok(Some(signal(Entity::Target, target))),
            (None, Some(acquirer)) => Ok(Some(signal(Entity::Acquirer, acquirer))),
            (None, None) => Ok(None),
        }
    }

    /// First keyword of `entity` found in `key`.
    fn mentions(&self, key: &str, entity: Entity) -> Option<&str> {
        let keywords = match entity {
            Entity::Target => &self.target_keywords,
            Entity::Acquirer => &self.acquirer_keywords,
        };
        keywords
            .iter()
            .find(|keyword| contains_words(key, keyword))
            .map(|keyword| keyword.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealsight_models::{FieldMatch, MatchKind, TableSource};
    use uuid::Uuid;

    fn resolver() -> EntityResolver {
        EntityResolver::new(&EntityKeywords::default())
    }

    fn table(source: TableSource, headers: &[&str], rows: &[&[&str]]) -> NormalizedTable {
        NormalizedTable::new(
            Uuid::new_v4(),
            source,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            0.9,
            vec![],
        )
    }

    fn source(section: Option<&str>, filename: Option<&str>) -> TableSource {
        TableSource {
            source_id: "doc".into(),
            filename: filename.map(String::from),
            section_context: section.map(String::from),
            ingested_at: None,
        }
    }

    fn entity_mapping(column: usize) -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.insert(
            CanonicalField::Entity,
            FieldMatch { header: "Entity".into(), column, confidence: 1.0, kind: MatchKind::Exact },
        );
        mapping
    }

    #[test]
    fn test_section_signal_is_high_confidence() {
        let t = table(source(Some("Target Company Application Inventory"), None), &["App"], &[&["SAP"]]);
        let resolution = resolver().resolve(&t, &FieldMapping::new()).unwrap();
        assert_eq!(resolution.tag, EntityTag::Target);
        assert_eq!(resolution.confidence, SECTION_CONFIDENCE);
    }

    #[test]
    fn test_filename_only_is_low_confidence() {
        let t = table(source(None, Some("buyer_systems.xlsx")), &["App"], &[&["SAP"]]);
        let resolution = resolver().resolve(&t, &FieldMapping::new()).unwrap();
        assert_eq!(resolution.tag, EntityTag::Acquirer);
        assert_eq!(resolution.confidence, FILENAME_CONFIDENCE);
        assert_eq!(resolution.signals[0].strength, SignalStrength::Low);
    }

    #[test]
    fn test_agreeing_signals_corroborate() {
        let t = table(source(Some("Acquirer systems"), Some("acquirer.csv")), &["App"], &[&["SAP"]]);
        let resolution = resolver().resolve(&t, &FieldMapping::new()).unwrap();
        assert_eq!(resolution.tag, EntityTag::Acquirer);
        assert_eq!(resolution.confidence, CORROBORATED_CONFIDENCE);
        assert_eq!(resolution.signals.len(), 2);
    }

    #[test]
    fn test_conflicting_signals_raise_ambiguity() {
        let t = table(source(Some("Target"), Some("Acquirer_inventory.xlsx")), &["App"], &[&["SAP"]]);
        match resolver().resolve(&t, &FieldMapping::new()) {
            Err(DealsightError::Ambiguity { signals, .. }) => {
                assert_eq!(signals.len(), 2);
                assert!(signals[0].contains("target"));
                assert!(signals[1].contains("acquirer"));
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_section_naming_both_parties_is_ambiguous() {
        let t = table(source(Some("Target vs Acquirer overlap"), None), &["App"], &[&["SAP"]]);
        assert!(matches!(
            resolver().resolve(&t, &FieldMapping::new()),
            Err(DealsightError::Ambiguity { .. })
        ));
    }

    #[test]
    fn test_no_signal_is_unresolved() {
        let t = table(source(Some("Application inventory"), Some("apps.csv")), &["App"], &[&["SAP"]]);
        let resolution = resolver().resolve(&t, &FieldMapping::new()).unwrap();
        assert_eq!(resolution.tag, EntityTag::Unresolved);
        assert_eq!(resolution.tag.entity(), None);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let t = table(source(Some("Targeted marketing tools"), None), &["App"], &[&["SAP"]]);
        let resolution = resolver().resolve(&t, &FieldMapping::new()).unwrap();
        assert_eq!(resolution.tag, EntityTag::Unresolved);
    }

    #[test]
    fn test_entity_column_wins() {
        let t = table(
            source(Some("Target"), None),
            &["App", "Entity"],
            &[&["SAP", "Acquirer"], &["Slack", "Target"]],
        );
        let resolution = resolver().resolve(&t, &entity_mapping(1)).unwrap();
        assert_eq!(resolution.tag, EntityTag::PerRow { column: 1 });
    }

    #[test]
    fn test_entity_column_needs_recognisable_values() {
        let t = table(source(None, None), &["App", "Company"], &[&["SAP", "Acme Ltd"]]);
        assert_eq!(resolver().entity_column(&t, &entity_mapping(1)), None);
    }

    #[test]
    fn test_entity_values() {
        let r = resolver();
        assert_eq!(r.entity_for_value(" TARGET "), Some(Entity::Target));
        assert_eq!(r.entity_for_value("Buyer"), Some(Entity::Acquirer));
        assert_eq!(r.entity_for_value("Seller Co"), Some(Entity::Target));
        assert_eq!(r.entity_for_value("Acme"), None);
        assert_eq!(r.entity_for_value(""), None);
    }

    #[test]
    fn test_split_by_entity() {
        let t = table(
            source(None, None),
            &["App", "Entity", "Users"],
            &[&["SAP", "Target", "100"], &["Slack", "Acquirer", "20"], &["Jira", "target", "5"]],
        );
        let parts = resolver().split_by_entity(&t, 1).unwrap();
        assert_eq!(parts[&Entity::Target].row_count(), 2);
        assert_eq!(parts[&Entity::Acquirer].row_count(), 1);
        assert_eq!(parts[&Entity::Acquirer].headers(), &["App".to_string(), "Users".to_string()]);
    }

    #[test]
    fn test_split_rejects_unlabelled_rows() {
        let t = table(
            source(None, None),
            &["App", "Entity"],
            &[&["SAP", "Target"], &["Slack", ""]],
        );
        let err = resolver().split_by_entity(&t, 1).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
