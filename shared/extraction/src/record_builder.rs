//! Inventory Record Builder
//! 
//! Turns one normalized, entity-resolved table into validated
//! `InventoryRecord`s. A table without a resolved entity produces no
//! records at all, except on the legacy path for data ingested before
//! entity enforcement started.

use chrono::{DateTime, Utc};
use dealsight_models::{
    CanonicalField, ComplexityTier, DeploymentType, EnrichmentMethod, Entity, EntityResolution, EntityTag,
    FieldMapping, InventoryRecord, NormalizedTable, Provenance, ReviewReason,
};
use dealsight_utils::{validate_model, DealsightError, DealsightResult, ExtractionConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cells::{parse_count, parse_count_u32, parse_data_volume_gb, parse_flag, parse_text};

/// Confidence attached to entities assigned on the legacy path.
pub const LEGACY_ENTITY_CONFIDENCE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct RecordBuilder {
    review_threshold: f64,
    entity_enforcement_cutoff: Option<DateTime<Utc>>,
    legacy_default_entity: Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// Party every record of the table was attributed to
    pub entity: Entity,
    pub entity_confidence: f64,
    pub records: Vec<InventoryRecord>,
    /// Rows without an application name
    pub skipped_rows: Vec<usize>,
    /// Rows whose record failed validation
    pub rejected_rows: Vec<usize>,
    pub warnings: Vec<String>,
}

struct EntityAssignment {
    entity: Entity,
    confidence: f64,
    legacy: bool,
}

impl RecordBuilder {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            review_threshold: config.review_threshold,
            entity_enforcement_cutoff: config.entity_enforcement_cutoff,
            legacy_default_entity: config.legacy_default_entity,
        }
    }

    pub fn build(
        &self,
        table: &NormalizedTable,
        mapping: &FieldMapping,
        resolution: &EntityResolution,
    ) -> DealsightResult<BuildOutcome> {
        let assignment = self.assign_entity(table, resolution)?;
        let name_column = mapping.column(CanonicalField::Application).ok_or_else(|| {
            DealsightError::validation(
                "application",
                format!("table {} has no column mapped to the application name", table.id()),
            )
        })?;

        let mut outcome = BuildOutcome {
            entity: assignment.entity,
            entity_confidence: assignment.confidence,
            records: Vec::new(),
            skipped_rows: Vec::new(),
            rejected_rows: Vec::new(),
            warnings: Vec::new(),
        };
        if assignment.legacy {
            outcome.warnings.push(format!(
                "entity inferred as {} for legacy table {}",
                assignment.entity,
                table.id()
            ));
        }

        for row in 0..table.row_count() {
            let name = match parse_text(table.cell(row, name_column)) {
                Some(name) => name,
                None => {
                    outcome.skipped_rows.push(row);
                    continue;
                }
            };

            let record = self.build_record(table, mapping, &assignment, row, name);
            match validate_model(&record) {
                Ok(()) => outcome.records.push(record),
                Err(e) => {
                    warn!("Rejected row {} of table {}: {}", row, table.id(), e);
                    outcome.warnings.push(format!("Row {} rejected: {}", row, e));
                    outcome.rejected_rows.push(row);
                }
            }
        }

        if !outcome.skipped_rows.is_empty() {
            warn!(
                "Skipped {} row(s) without an application name in table {}",
                outcome.skipped_rows.len(),
                table.id()
            );
            outcome.warnings.push(format!(
                "{} row(s) had no application name and were skipped",
                outcome.skipped_rows.len()
            ));
        }

        Ok(outcome)
    }

    fn assign_entity(&self, table: &NormalizedTable, resolution: &EntityResolution) -> DealsightResult<EntityAssignment> {
        if let Some(entity) = resolution.tag.entity() {
            return Ok(EntityAssignment {
                entity,
                confidence: resolution.confidence,
                legacy: false,
            });
        }

        match resolution.tag {
            EntityTag::PerRow { column } => Err(DealsightError::validation(
                "entity",
                format!(
                    "table {} carries entity column {} and must be split before records are built",
                    table.id(),
                    column
                ),
            )),
            EntityTag::Unresolved if self.is_legacy(table) => {
                warn!(
                    "Legacy table {} from {} has no entity signal; assigning {} for review",
                    table.id(),
                    table.source().source_id,
                    self.legacy_default_entity
                );
                Ok(EntityAssignment {
                    entity: self.legacy_default_entity,
                    confidence: LEGACY_ENTITY_CONFIDENCE,
                    legacy: true,
                })
            }
            _ => Err(DealsightError::validation(
                "entity",
                format!(
                    "no entity signal for table {} from {}; records refused",
                    table.id(),
                    table.source().source_id
                ),
            )),
        }
    }

    /// Strictly before the enforcement cutoff; no cutoff means no legacy data.
    fn is_legacy(&self, table: &NormalizedTable) -> bool {
        match (self.entity_enforcement_cutoff, table.source().ingested_at) {
            (Some(cutoff), Some(ingested_at)) => ingested_at < cutoff,
            _ => false,
        }
    }

    fn build_record(
        &self,
        table: &NormalizedTable,
        mapping: &FieldMapping,
        assignment: &EntityAssignment,
        row: usize,
        name: String,
    ) -> InventoryRecord {
        let cell = |field: CanonicalField| mapping.column(field).map(|column| table.cell(row, column));

        let provenance = Provenance {
            source_table_id: table.id(),
            source_id: table.source().source_id.clone(),
            source_row: row,
            extraction_confidence: table.extraction_quality(),
            entity_confidence: assignment.confidence,
            enrichment: EnrichmentMethod::None,
        };

        let mut record = InventoryRecord::new(assignment.entity, name, provenance);
        record.vendor = cell(CanonicalField::Vendor).and_then(parse_text);
        record.category = cell(CanonicalField::Category).and_then(parse_text);
        record.user_count = cell(CanonicalField::UserCount).and_then(parse_count);
        record.complexity = cell(CanonicalField::Complexity).and_then(ComplexityTier::parse_label);
        record.deployment = cell(CanonicalField::Deployment).and_then(DeploymentType::parse_label);

        let integration = &mut record.integration;
        if let Some(count) = cell(CanonicalField::IntegrationCount).and_then(parse_count_u32) {
            integration.integration_count = count;
        }
        if let Some(sso) = cell(CanonicalField::SsoRequired).and_then(parse_flag) {
            integration.sso_required = sso;
        }
        if let Some(volume) = cell(CanonicalField::DataVolume).and_then(parse_data_volume_gb) {
            integration.data_volume_gb = volume;
        }
        if let Some(count) = cell(CanonicalField::CustomInterfaces).and_then(parse_count_u32) {
            integration.custom_interface_count = count;
        }
        if let Some(hosted) = cell(CanonicalField::ParentHosted).and_then(parse_flag) {
            integration.parent_hosted = hosted;
        }

        if table.extraction_quality() < self.review_threshold {
            record.flag_for_review(ReviewReason::LowExtractionQuality {
                score: table.extraction_quality(),
            });
        }
        if assignment.confidence < self.review_threshold {
            record.flag_for_review(ReviewReason::LowConfidenceEntity {
                confidence: assignment.confidence,
            });
        }
        if record.category.is_none() {
            record.flag_for_review(ReviewReason::UnresolvedCategory);
        }
        if assignment.legacy {
            record.flag_for_review(ReviewReason::LegacyEntityInference);
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dealsight_models::{FieldMatch, MatchKind, TableSource};
    use uuid::Uuid;

    fn table(quality: f64, ingested_at: Option<DateTime<Utc>>) -> NormalizedTable {
        NormalizedTable::new(
            Uuid::new_v4(),
            TableSource {
                source_id: "inventory.xlsx#Apps".into(),
                ingested_at,
                ..Default::default()
            },
            vec!["Application".into(), "Category".into(), "Users".into(), "SSO".into(), "Data".into()],
            vec![
                vec!["SAP ECC".into(), "ERP".into(), "1,200".into(), "Yes".into(), "2 TB".into()],
                vec!["".into(), "".into(), "".into(), "".into(), "".into()],
                vec!["Slack".into(), "".into(), "300".into(), "no".into(), "".into()],
            ],
            quality,
            vec![],
        )
    }

    fn mapping() -> FieldMapping {
        let mut mapping = FieldMapping::new();
        for (column, field) in [
            CanonicalField::Application,
            CanonicalField::Category,
            CanonicalField::UserCount,
            CanonicalField::SsoRequired,
            CanonicalField::DataVolume,
        ]
        .into_iter()
        .enumerate()
        {
            mapping.insert(
                field,
                FieldMatch { header: field.label().into(), column, confidence: 1.0, kind: MatchKind::Exact },
            );
        }
        mapping
    }

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_builds_records_with_parsed_attributes() {
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let resolution = EntityResolution::resolved(Entity::Target, 0.9, vec![]);
        let outcome = builder.build(&table(0.9, None), &mapping(), &resolution).unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped_rows, vec![1]);

        let sap = &outcome.records[0];
        assert_eq!(sap.entity, Entity::Target);
        assert_eq!(sap.category.as_deref(), Some("ERP"));
        assert_eq!(sap.user_count, Some(1200));
        assert!(sap.integration.sso_required);
        assert_eq!(sap.integration.data_volume_gb, 2048.0);
        assert_eq!(sap.provenance.source_row, 0);
        assert!(!sap.needs_review);

        let slack = &outcome.records[1];
        assert!(slack.needs_review);
        assert_eq!(slack.review_reasons, vec![ReviewReason::UnresolvedCategory]);
    }

    #[test]
    fn test_invalid_row_is_rejected_alone() {
        let table = NormalizedTable::new(
            Uuid::new_v4(),
            TableSource::default(),
            vec!["Application".into(), "Category".into(), "Users".into(), "SSO".into(), "Data".into()],
            vec![
                vec!["SAP ECC".into(), "ERP".into(), "1,200".into(), "Yes".into(), "2 TB".into()],
                vec!["X".repeat(300), "CRM".into(), "10".into(), "no".into(), "".into()],
                vec!["Slack".into(), "Collaboration".into(), "300".into(), "no".into(), "".into()],
            ],
            0.9,
            vec![],
        );
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let resolution = EntityResolution::resolved(Entity::Target, 0.9, vec![]);
        let outcome = builder.build(&table, &mapping(), &resolution).unwrap();

        assert_eq!(outcome.rejected_rows, vec![1]);
        assert!(outcome.skipped_rows.is_empty());
        let names: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SAP ECC", "Slack"]);
        assert!(outcome.warnings.iter().any(|w| w.starts_with("Row 1 rejected")));
    }

    #[test]
    fn test_unresolved_entity_blocks_table() {
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let err = builder
            .build(&table(0.9, None), &mapping(), &EntityResolution::unresolved())
            .unwrap_err();
        assert!(matches!(err, DealsightError::Validation { ref field, .. } if field == "entity"));
    }

    #[test]
    fn test_per_row_tag_must_be_split_first() {
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let resolution = EntityResolution {
            tag: EntityTag::PerRow { column: 1 },
            confidence: 1.0,
            signals: vec![],
        };
        assert!(builder.build(&table(0.9, None), &mapping(), &resolution).is_err());
    }

    #[test]
    fn test_legacy_path_before_cutoff() {
        let config = ExtractionConfig {
            entity_enforcement_cutoff: Some(cutoff()),
            legacy_default_entity: Entity::Acquirer,
            ..Default::default()
        };
        let builder = RecordBuilder::new(&config);
        let ingested = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        let outcome = builder
            .build(&table(0.9, Some(ingested)), &mapping(), &EntityResolution::unresolved())
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        for record in &outcome.records {
            assert_eq!(record.entity, Entity::Acquirer);
            assert!(record.needs_review);
            assert!(record.review_reasons.contains(&ReviewReason::LegacyEntityInference));
            assert_eq!(record.provenance.entity_confidence, LEGACY_ENTITY_CONFIDENCE);
        }
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn test_legacy_path_not_taken_after_cutoff() {
        let config = ExtractionConfig {
            entity_enforcement_cutoff: Some(cutoff()),
            ..Default::default()
        };
        let builder = RecordBuilder::new(&config);
        let ingested = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        assert!(builder
            .build(&table(0.9, Some(ingested)), &mapping(), &EntityResolution::unresolved())
            .is_err());
        assert!(builder
            .build(&table(0.9, None), &mapping(), &EntityResolution::unresolved())
            .is_err());
    }

    #[test]
    fn test_low_quality_and_weak_entity_flag_review() {
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let resolution = EntityResolution::resolved(Entity::Acquirer, 0.5, vec![]);
        let outcome = builder.build(&table(0.4, None), &mapping(), &resolution).unwrap();

        let sap = &outcome.records[0];
        assert!(sap.needs_review);
        assert!(sap.review_reasons.contains(&ReviewReason::LowExtractionQuality { score: 0.4 }));
        assert!(sap.review_reasons.contains(&ReviewReason::LowConfidenceEntity { confidence: 0.5 }));
    }

    #[test]
    fn test_missing_application_column() {
        let builder = RecordBuilder::new(&ExtractionConfig::default());
        let resolution = EntityResolution::resolved(Entity::Target, 0.9, vec![]);
        let err = builder
            .build(&table(0.9, None), &FieldMapping::new(), &resolution)
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
