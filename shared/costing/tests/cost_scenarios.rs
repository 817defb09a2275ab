//! Dealsight Cost Scenario Tests

use dealsight_costing::{CostAggregator, CostCalculator};
use dealsight_models::{
    ComplexityTier, DealContext, DealType, DeploymentType, EnrichmentMethod, Entity, InventoryRecord, Provenance,
};
use dealsight_utils::{ClassificationConfig, CostModelConfig};
use proptest::prelude::*;
use uuid::Uuid;

fn calculator() -> CostCalculator {
    CostCalculator::new(&ClassificationConfig::default(), &CostModelConfig::default())
}

fn record(name: &str, entity: Entity) -> InventoryRecord {
    InventoryRecord::new(
        entity,
        name,
        Provenance {
            source_table_id: Uuid::new_v4(),
            source_id: "inventory.xlsx".into(),
            source_row: 0,
            extraction_confidence: 0.9,
            entity_confidence: 0.9,
            enrichment: EnrichmentMethod::None,
        },
    )
}

fn critical_erp() -> InventoryRecord {
    let mut rec = record("SAP ECC", Entity::Target);
    rec.category = Some("ERP".into());
    rec.deployment = Some(DeploymentType::OnPremises);
    rec.user_count = Some(400);
    rec.integration.integration_count = 5;
    rec.integration.sso_required = true;
    rec.integration.data_volume_gb = 200.0;
    rec.integration.parent_hosted = true;
    rec
}

// ===== Deal scenarios =====

mod deal_scenario_tests {
    use super::*;

    #[test]
    fn test_critical_on_prem_carve_out() {
        let deal = DealContext::new(DealType::CarveOut, 1.3);
        let breakdown = calculator().breakdown(&critical_erp(), &deal).unwrap();

        assert_eq!(breakdown.complexity, ComplexityTier::Critical);
        assert!(breakdown.transition_service_total > 0.0);
        assert!(breakdown.one_time_total > 10.0 * breakdown.base_cost);

        let expected_base = 25_000.0 * 3.0 * 1.5 * 1.3 * 1.3;
        assert!((breakdown.one_time_base - expected_base).abs() < 1e-6);
        assert_eq!(breakdown.integration.total, 135_000.0);
        assert_eq!(breakdown.transition_service.total, 20_000.0 * 1.25 * 12.0);
        assert!(
            (breakdown.grand_total - (breakdown.one_time_total + breakdown.transition_service_total)).abs() < 1e-6
        );
    }

    #[test]
    fn test_simple_saas_acquisition_has_no_transition_cost() {
        let mut rec = record("Slack", Entity::Target);
        rec.category = Some("Collaboration".into());
        rec.deployment = Some(DeploymentType::Saas);
        rec.complexity = Some(ComplexityTier::Simple);
        rec.user_count = Some(60);

        let deal = DealContext::new(DealType::Acquisition, 1.0);
        let breakdown = calculator().breakdown(&rec, &deal).unwrap();

        assert_eq!(breakdown.transition_service_total, 0.0);
        assert!(!breakdown.transition_service.applies);
    }

    #[test]
    fn test_acquisition_never_charges_transition_service() {
        let deal = DealContext::new(DealType::Acquisition, 1.0);
        let breakdown = calculator().breakdown(&critical_erp(), &deal).unwrap();
        assert_eq!(breakdown.transition_service_total, 0.0);
    }

    #[test]
    fn test_portfolio_summary_for_target() {
        let calc = calculator();
        let deal = CostModelConfig::default()
            .default_deal_context(DealType::Divestiture)
            .with_entity_scope(Entity::Target);

        let mut chat = record("Zoom", Entity::Target);
        chat.user_count = Some(30);
        let records = vec![critical_erp(), chat, record("Salesforce", Entity::Acquirer)];

        let breakdowns = calc.breakdowns(&records, &deal).unwrap();
        let summary = CostAggregator::new().summarize(&breakdowns, deal.entity_scope, deal.deal_type);

        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.ranked[0].record_name, "SAP ECC");
        assert_eq!(summary.by_tier[&ComplexityTier::Simple].record_count, 1);
        assert!(summary.total_transition_service > 0.0);
    }
}

// ===== Multiplier positivity =====

mod multiplier_tests {
    use super::*;

    fn category_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            "[A-Za-z ]{0,20}".prop_map(Some),
            Just(Some("ERP".to_string())),
            Just(Some("Finance and Accounting".to_string())),
            Just(Some("Collaboration".to_string())),
        ]
    }

    #[test]
    fn test_every_tier_and_deployment_multiplier_positive() {
        let config = ClassificationConfig::default();
        for tier in ComplexityTier::ALL {
            assert!(config.complexity_multiplier(tier) > 0.0);
        }
        for deployment in DeploymentType::ALL {
            assert!(config.deployment_multiplier(deployment) > 0.0);
        }
        for multiplier in config.category_multipliers.values() {
            assert!(*multiplier > 0.0);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_breakdown_multipliers_positive(
            category in category_strategy(),
            users in proptest::option::of(0u64..100_000),
            integrations in 0u32..50,
            parent_hosted in any::<bool>(),
            deal_type in prop_oneof![
                Just(DealType::Acquisition),
                Just(DealType::Merger),
                Just(DealType::CarveOut),
                Just(DealType::Divestiture),
            ],
            multiplier in 0.01f64..5.0,
        ) {
            let mut rec = record("System", Entity::Target);
            rec.category = category;
            rec.user_count = users;
            rec.integration.integration_count = integrations;
            rec.integration.parent_hosted = parent_hosted;

            let deal = DealContext::new(deal_type, multiplier);
            let breakdown = calculator().breakdown(&rec, &deal).unwrap();

            prop_assert!(breakdown.multipliers.all_positive());
            prop_assert!(breakdown.one_time_total >= breakdown.one_time_base);
            let tsa_expected = deal_type.separates_from_parent() && parent_hosted;
            prop_assert_eq!(breakdown.transition_service.applies, tsa_expected);
            prop_assert_eq!(breakdown.transition_service_total > 0.0, tsa_expected);
        }
    }
}
