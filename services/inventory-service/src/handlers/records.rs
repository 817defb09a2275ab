//! Record Handlers

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use dealsight_models::{Entity, InventoryRecord, RecordCorrection};
use dealsight_utils::{validate_model, DealsightError};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::store::RecordFilter;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub entity: Option<Entity>,
    pub needs_review: Option<bool>,
}

/// GET /api/v1/records
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Json<Vec<InventoryRecord>> {
    let filter = RecordFilter {
        entity: query.entity,
        needs_review: query.needs_review,
    };
    Json(state.store.list(filter).await)
}

/// GET /api/v1/records/:id
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InventoryRecord>> {
    let record = state
        .store
        .get(id)
        .await
        .ok_or_else(|| DealsightError::not_found(format!("record {}", id)))?;
    Ok(Json(record))
}

/// Manual correction; provenance becomes manual and the review flag clears
/// 
/// PUT /api/v1/records/:id
pub async fn correct_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(correction): Json<RecordCorrection>,
) -> ApiResult<Json<InventoryRecord>> {
    validate_model(&correction)?;
    let record = state
        .store
        .apply_correction(id, correction, state.calculator.classifier())
        .await?;
    info!("Record {} corrected manually", id);
    Ok(Json(record))
}
