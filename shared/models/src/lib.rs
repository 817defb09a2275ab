//! # Dealsight Core Domain Models
//! 
//! Plain structured data shared by the extraction pipeline, the costing
//! engine and the inventory service. Nothing here carries behaviour beyond
//! construction, validation and small derived views.
//! 
//! ## Key Models
//! 
//! - **RawTable / NormalizedTable**: tabular input before and after structure normalization
//! - **FieldMapping**: canonical field to column assignment with per-field confidence
//! - **EntityTag / EntityResolution**: which party (target or acquirer) a table belongs to
//! - **InventoryRecord**: validated inventory entry with provenance and review state
//! - **CostBreakdown / PortfolioCostSummary**: derived cost views for a deal context
//! 
//! ## Validation
//! 
//! Records, corrections and deal contexts derive `validator::Validate`:
//! - Name length bounds
//! - Confidence scores within [0, 1]
//! - Non-negative data volumes, strictly positive deal multiplier

pub mod table;
pub mod mapping;
pub mod entity;
pub mod inventory;
pub mod cost;


pub use table::*;
pub use mapping::*;
pub use entity::*;
pub use inventory::*;
pub use cost::*;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_record_serializes_entity_as_plain_string() {
        let record = InventoryRecord::new(
            Entity::Target,
            "Workday",
            Provenance {
                source_table_id: Uuid::new_v4(),
                source_id: "doc".into(),
                source_row: 3,
                extraction_confidence: 0.8,
                entity_confidence: 0.9,
                enrichment: EnrichmentMethod::None,
            },
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["entity"], "target");
        assert_eq!(json["provenance"]["enrichment"], "none");
        assert_eq!(json["needs_review"], false);
    }

    #[test]
    fn test_entity_tag_serialization() {
        let json = serde_json::to_value(EntityTag::PerRow { column: 4 }).unwrap();
        assert_eq!(json["kind"], "per_row");
        assert_eq!(json["column"], 4);
    }
}
