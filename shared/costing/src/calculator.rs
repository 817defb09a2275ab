//! Cost Calculator
//! 
//! `one_time_base = base_cost * complexity * category * deployment * deal`
//! plus additive integration costs, plus a transition-service cost that
//! only exists when the deal separates the unit from its parent and the
//! parent hosts the system.

use dealsight_models::{
    AppliedMultipliers, ComplexityTier, CostBreakdown, DealContext, InventoryRecord, IntegrationAttributes,
    IntegrationCosts, TransitionServiceCost,
};
use dealsight_utils::{validate_model, ClassificationConfig, CostModelConfig, DealsightError, DealsightResult};
use tracing::debug;

use crate::classification::ClassificationEngine;

#[derive(Debug, Clone)]
pub struct CostCalculator {
    classifier: ClassificationEngine,
    cost: CostModelConfig,
}

impl CostCalculator {
    pub fn new(classification: &ClassificationConfig, cost: &CostModelConfig) -> Self {
        Self {
            classifier: ClassificationEngine::new(classification),
            cost: cost.clone(),
        }
    }

    pub fn classifier(&self) -> &ClassificationEngine {
        &self.classifier
    }

    pub fn breakdown(&self, record: &InventoryRecord, deal: &DealContext) -> DealsightResult<CostBreakdown> {
        Self::validate_deal(deal)?;

        let classification = self.classifier.classify(record);
        let multipliers = AppliedMultipliers {
            complexity: classification.complexity_multiplier,
            category: classification.category_multiplier,
            deployment: classification.deployment_multiplier,
            deal_context: deal.multiplier,
        };
        if !multipliers.all_positive() {
            return Err(DealsightError::configuration(format!(
                "non-positive multiplier for record {}: {:?}",
                record.id, multipliers
            )));
        }

        let one_time_base = self.cost.base_cost * multipliers.product();
        let integration = self.integration_costs(&record.integration);
        let transition_service = self.transition_service(record, classification.complexity, deal)?;

        let one_time_total = one_time_base + integration.total;
        let grand_total = one_time_total + transition_service.total;
        debug!(
            "Costed {} ({}): one-time {:.2}, transition {:.2}",
            record.name, classification.complexity, one_time_total, transition_service.total
        );

        Ok(CostBreakdown {
            record_id: record.id,
            record_name: record.name.clone(),
            entity: record.entity,
            deal_type: deal.deal_type,
            complexity: classification.complexity,
            deployment: classification.deployment,
            base_cost: self.cost.base_cost,
            multipliers,
            one_time_base,
            integration,
            transition_service,
            one_time_total,
            transition_service_total: transition_service.total,
            grand_total,
        })
    }

    /// Breakdowns for every record in the deal's entity scope.
    pub fn breakdowns(&self, records: &[InventoryRecord], deal: &DealContext) -> DealsightResult<Vec<CostBreakdown>> {
        Self::validate_deal(deal)?;
        records
            .iter()
            .filter(|r| deal.entity_scope.map_or(true, |scope| r.entity == scope))
            .map(|r| self.breakdown(r, deal))
            .collect()
    }

    pub fn integration_costs(&self, integration: &IntegrationAttributes) -> IntegrationCosts {
        let integrations = integration.integration_count as f64 * self.cost.per_integration_cost;
        let single_sign_on = if integration.sso_required { self.cost.sso_cost } else { 0.0 };
        let data_volume = integration.data_volume_gb.max(0.0) * self.cost.per_gb_cost;
        let custom_interfaces = integration.custom_interface_count as f64 * self.cost.per_custom_interface_cost;

        IntegrationCosts {
            integrations,
            single_sign_on,
            data_volume,
            custom_interfaces,
            total: integrations + single_sign_on + data_volume + custom_interfaces,
        }
    }

    pub fn transition_service(
        &self,
        record: &InventoryRecord,
        tier: ComplexityTier,
        deal: &DealContext,
    ) -> DealsightResult<TransitionServiceCost> {
        if !(deal.deal_type.separates_from_parent() && record.integration.parent_hosted) {
            return Ok(TransitionServiceCost::default());
        }

        let monthly_rate = self.cost.tsa_monthly_rates.get(&tier).copied().ok_or_else(|| {
            DealsightError::configuration(format!("no transition-service rate for tier {}", tier))
        })?;
        let user_factor = self.user_factor(record.user_count);
        let duration_months = deal
            .tsa_duration_months
            .unwrap_or(self.cost.tsa_default_duration_months);

        Ok(TransitionServiceCost {
            applies: true,
            monthly_rate,
            user_factor,
            duration_months,
            total: monthly_rate * user_factor * duration_months as f64,
        })
    }

    /// Factor of the first band covering `users`; unknown counts use the
    /// smallest band.
    pub fn user_factor(&self, users: Option<u64>) -> f64 {
        let users = users.unwrap_or(0);
        self.cost
            .tsa_user_bands
            .iter()
            .find(|band| band.up_to.map_or(true, |limit| users <= limit))
            .or(self.cost.tsa_user_bands.last())
            .map(|band| band.factor)
            .unwrap_or(1.0)
    }

    /// Rejects deal multipliers that are not strictly positive.
    pub fn validate_deal(deal: &DealContext) -> DealsightResult<()> {
        if !(deal.multiplier > 0.0 && deal.multiplier.is_finite()) {
            return Err(DealsightError::validation(
                "deal_context.multiplier",
                format!("deal multiplier must be strictly positive, got {}", deal.multiplier),
            ));
        }
        validate_model(deal)
    }
}
