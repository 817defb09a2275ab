//! Cost Aggregator

use dealsight_models::{CostBreakdown, DealType, Entity, PortfolioCostSummary, RankedRecord};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct CostAggregator;

impl CostAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Roll-up of the breakdowns inside `entity_scope` (all when `None`).
    /// Empty input yields a zeroed summary.
    pub fn summarize(
        &self,
        breakdowns: &[CostBreakdown],
        entity_scope: Option<Entity>,
        deal_type: DealType,
    ) -> PortfolioCostSummary {
        let mut summary = PortfolioCostSummary::empty(entity_scope, deal_type);

        for breakdown in breakdowns
            .iter()
            .filter(|b| entity_scope.map_or(true, |scope| b.entity == scope))
        {
            summary.record_count += 1;
            summary.total_one_time += breakdown.one_time_total;
            summary.total_integration += breakdown.integration.total;
            summary.total_transition_service += breakdown.transition_service_total;
            summary.grand_total += breakdown.grand_total;

            let group = summary.by_tier.entry(breakdown.complexity).or_default();
            group.record_count += 1;
            group.one_time_total += breakdown.one_time_total;
            group.grand_total += breakdown.grand_total;
            group.record_ids.push(breakdown.record_id);

            summary.ranked.push(RankedRecord {
                record_id: breakdown.record_id,
                record_name: breakdown.record_name.clone(),
                complexity: breakdown.complexity,
                grand_total: breakdown.grand_total,
            });
        }

        summary.ranked.sort_by(|a, b| {
            b.grand_total
                .total_cmp(&a.grand_total)
                .then_with(|| a.record_name.cmp(&b.record_name))
                .then_with(|| a.record_id.cmp(&b.record_id))
        });

        summary
    }

    /// One summary per entity present in `breakdowns`.
    pub fn summarize_by_entity(
        &self,
        breakdowns: &[CostBreakdown],
        deal_type: DealType,
    ) -> BTreeMap<Entity, PortfolioCostSummary> {
        let mut entities: Vec<Entity> = breakdowns.iter().map(|b| b.entity).collect();
        entities.sort();
        entities.dedup();

        entities
            .into_iter()
            .map(|entity| (entity, self.summarize(breakdowns, Some(entity), deal_type)))
            .collect()
    }
}
