use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(upload_documents))
        .route("/tables", post(ingest_tables))
        .route("/records", get(list_records))
        .route("/records/:id", get(get_record).put(correct_record))
        .route("/costs/breakdowns", post(cost_breakdowns))
        .route("/costs/summary", post(cost_summary))
}
