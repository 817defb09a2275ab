//! Cost Handlers
//! 
//! Breakdowns and summaries are computed from the current records on every
//! request and never stored.

use axum::{extract::State, response::Json};
use dealsight_models::{CostBreakdown, DealContext, DealType, Entity, PortfolioCostSummary, RankedRecord};
use dealsight_utils::DealsightResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::store::RecordFilter;
use crate::AppState;

/// Deal context as supplied by the caller. Missing values fall back to the
/// configured defaults for the deal type.
#[derive(Debug, Clone, Deserialize)]
pub struct CostRequest {
    pub deal_type: DealType,
    pub multiplier: Option<f64>,
    pub entity_scope: Option<Entity>,
    pub tsa_duration_months: Option<u32>,
    pub top_n: Option<usize>,
}

impl CostRequest {
    fn deal_context(&self, state: &AppState) -> DealContext {
        let mut deal = state.config.cost.default_deal_context(self.deal_type);
        if let Some(multiplier) = self.multiplier {
            deal.multiplier = multiplier;
        }
        deal.entity_scope = self.entity_scope;
        deal.tsa_duration_months = self.tsa_duration_months;
        deal
    }
}

#[derive(Debug, Serialize)]
pub struct CostSummaryResponse {
    pub summary: PortfolioCostSummary,
    pub top: Vec<RankedRecord>,
    pub by_entity: BTreeMap<Entity, PortfolioCostSummary>,
}

/// POST /api/v1/costs/breakdowns
pub async fn cost_breakdowns(
    State(state): State<AppState>,
    Json(request): Json<CostRequest>,
) -> ApiResult<Json<Vec<CostBreakdown>>> {
    let deal = request.deal_context(&state);
    Ok(Json(breakdowns(&state, &deal).await?))
}

/// POST /api/v1/costs/summary
pub async fn cost_summary(
    State(state): State<AppState>,
    Json(request): Json<CostRequest>,
) -> ApiResult<Json<CostSummaryResponse>> {
    let mut deal = request.deal_context(&state);
    let scope = deal.entity_scope.take();

    // Every entity is costed so the per-entity roll-up is complete
    let all = breakdowns(&state, &deal).await?;
    let summary = state.aggregator.summarize(&all, scope, deal.deal_type);
    let by_entity = state.aggregator.summarize_by_entity(&all, deal.deal_type);
    let top_n = request.top_n.unwrap_or(state.config.server.default_top_n);

    Ok(Json(CostSummaryResponse {
        top: summary.top(top_n).to_vec(),
        summary,
        by_entity,
    }))
}

async fn breakdowns(state: &AppState, deal: &DealContext) -> DealsightResult<Vec<CostBreakdown>> {
    let records = state.store.list(RecordFilter::default()).await;
    state.calculator.breakdowns(&records, deal)
}
