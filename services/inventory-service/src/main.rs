//! Dealsight Inventory Service
//! 
//! HTTP surface over the extraction pipeline and the costing engine.
//! Records live in an in-memory store; cost views are recomputed per request.

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::get,
    serve, Router,
};
use dealsight_costing::{CostAggregator, CostCalculator};
use dealsight_extraction::ExtractionPipeline;
use dealsight_utils::{init_logging, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

mod error;
mod handlers;
mod routes;
mod store;

use store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging)?;
    info!("Starting Dealsight Inventory Service");

    let app = create_app(AppState::new(config.clone()));

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server host {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Inventory Service listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let max_request_size = state.config.server.max_request_size;

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::PUT])
                        .allow_headers([header::CONTENT_TYPE]),
                )
                .layer(DefaultBodyLimit::max(max_request_size)),
        )
        .with_state(state)
}

/// Shared, read-only after start-up apart from the record store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: RecordStore,
    pub pipeline: Arc<ExtractionPipeline>,
    pub calculator: Arc<CostCalculator>,
    pub aggregator: CostAggregator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: Arc::new(ExtractionPipeline::new(&config.extraction)),
            calculator: Arc::new(CostCalculator::new(&config.classification, &config.cost)),
            aggregator: CostAggregator::new(),
            store: RecordStore::new(),
            config: Arc::new(config),
        }
    }
}
