//! Dealsight Extraction Scenario Tests
//! 
//! End-to-end runs of the extraction pipeline over realistic inventory
//! tables.

use dealsight_extraction::structure::expand_merged_headers;
use dealsight_extraction::ExtractionPipeline;
use dealsight_models::{CanonicalField, Entity, RawTable, ReviewReason};
use dealsight_utils::{DealsightError, ExtractionConfig};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn pipeline() -> ExtractionPipeline {
    ExtractionPipeline::new(&ExtractionConfig::default())
}

// ===== Structure and mapping =====

mod structure_tests {
    use super::*;

    #[test]
    fn test_merged_headers_expand() {
        let expanded = expand_merged_headers(&strings(&["Application", "", "Vendor", ""]));
        assert_eq!(expanded, strings(&["Application", "Application", "Vendor", "Vendor"]));
    }

    #[test]
    fn test_app_header_confidence() {
        let mapping = pipeline().mapper().map_headers(&strings(&["App"]));
        let matched = mapping.get(CanonicalField::Application).expect("App should map");
        assert!(matched.confidence >= 0.9);
    }

    #[test]
    fn test_stacked_header_table_extracts() {
        let raw = RawTable::new(
            "carve-out.xlsx#Systems",
            strings(&["Application", "", "Footprint", "", ""]),
            vec![
                strings(&["Name", "Vendor", "Users", "Integrations", "Data Volume"]),
                strings(&["SAP ECC", "SAP", "1,500", "12", "300"]),
                strings(&["Oracle EBS", "Oracle", "900", "7", "1.5 TB"]),
            ],
        )
        .with_section_context("Target Company Systems");

        let report = pipeline().process_table(&raw).unwrap();
        let partition = &report.partitions[0];

        assert_eq!(partition.mapping.column(CanonicalField::Application), Some(0));
        assert_eq!(partition.mapping.column(CanonicalField::Vendor), Some(1));
        assert_eq!(partition.mapping.column(CanonicalField::UserCount), Some(2));
        assert_eq!(partition.mapping.column(CanonicalField::IntegrationCount), Some(3));
        assert_eq!(partition.mapping.column(CanonicalField::DataVolume), Some(4));

        let oracle = partition.records.iter().find(|r| r.name == "Oracle EBS").unwrap();
        assert_eq!(oracle.user_count, Some(900));
        assert_eq!(oracle.integration.integration_count, 7);
        assert_eq!(oracle.integration.data_volume_gb, 1536.0);
    }
}

// ===== Entity attribution =====

mod entity_tests {
    use super::*;

    #[test]
    fn test_conflicting_signals_raise_ambiguity() {
        let raw = RawTable::new("acquirer_inventory.xlsx#Sheet1", strings(&["Application"]), vec![strings(&["SAP"])])
            .with_section_context("Target")
            .with_filename("Acquirer_inventory.xlsx");

        match pipeline().process_table(&raw) {
            Err(DealsightError::Ambiguity { signals, .. }) => assert_eq!(signals.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_table_without_signal_yields_no_records() {
        let raw = RawTable::new("apps.csv", strings(&["Application", "Vendor"]), vec![strings(&["SAP", "SAP SE"])])
            .with_filename("apps.csv");

        let report = pipeline().process_document("apps.csv", &[raw]);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.records().count(), 0);
    }

    #[test]
    fn test_entity_column_splits_table() {
        let raw = RawTable::new(
            "combined.csv",
            strings(&["Application", "Entity", "Category", "Users"]),
            vec![
                strings(&["SAP ECC", "Target", "ERP", "1,200"]),
                strings(&["Salesforce", "Acquirer", "CRM", "800"]),
                strings(&["Workday", "Target", "HR", "450"]),
            ],
        )
        .with_section_context("Combined application inventory");

        let report = pipeline().process_table(&raw).unwrap();
        assert_eq!(report.partitions.len(), 2);
        assert_eq!(report.record_count(), 3);

        for partition in &report.partitions {
            assert!(!partition.mapping.is_mapped(CanonicalField::Entity));
            assert!(partition.records.iter().all(|r| r.entity == partition.entity));
        }
        let target = report.partitions.iter().find(|p| p.entity == Entity::Target).unwrap();
        assert_eq!(target.records.len(), 2);
    }

    #[test]
    fn test_filename_only_flags_review() {
        let raw = RawTable::new(
            "buyer_apps.csv",
            strings(&["Application", "Category"]),
            vec![strings(&["Slack", "Collaboration"])],
        )
        .with_filename("buyer_apps.csv");

        let report = pipeline().process_table(&raw).unwrap();
        let record = report.records().next().unwrap();
        assert_eq!(record.entity, Entity::Acquirer);
        assert!(record.needs_review);
        assert!(record
            .review_reasons
            .iter()
            .any(|r| matches!(r, ReviewReason::LowConfidenceEntity { .. })));
    }
}
