//! Document Ingestion Handlers
//! 
//! Spreadsheet uploads and raw-table batches both end up as one extraction
//! job per source document, run on the blocking pool in parallel.

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use chrono::Utc;
use dealsight_costing::ClassificationEngine;
use dealsight_extraction::{DocumentReport, ExtractionPipeline, TableOutcome};
use dealsight_models::RawTable;
use dealsight_utils::{DealsightError, DealsightResult, SpreadsheetFormat, SpreadsheetReader};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub documents: Vec<DocumentIngestResult>,
    pub records_stored: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentIngestResult {
    pub source_id: String,
    pub format: Option<String>,
    pub warnings: Vec<String>,
    pub records_stored: usize,
    pub tables_failed: usize,
    pub report: DocumentReport,
}

#[derive(Debug, Deserialize)]
pub struct IngestTablesRequest {
    pub tables: Vec<RawTable>,
}

/// Source document waiting for extraction
enum DocumentJob {
    Spreadsheet { filename: String, content_type: Option<String>, data: Vec<u8> },
    Tables { source_id: String, tables: Vec<RawTable> },
}

/// Upload one or more spreadsheets
/// 
/// POST /api/v1/documents
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestResponse>> {
    let mut jobs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DealsightError::table_source(format!("Failed to read upload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| DealsightError::table_source(format!("Failed to read {}: {}", filename, e)))?;
        jobs.push(DocumentJob::Spreadsheet { filename, content_type, data: data.to_vec() });
    }

    if jobs.is_empty() {
        return Err(DealsightError::validation("file", "No file provided").into());
    }

    Ok(Json(ingest(&state, jobs).await?))
}

/// Accept raw tables from a document-conversion collaborator
/// 
/// POST /api/v1/tables
pub async fn ingest_tables(
    State(state): State<AppState>,
    Json(request): Json<IngestTablesRequest>,
) -> ApiResult<Json<IngestResponse>> {
    if request.tables.is_empty() {
        return Err(DealsightError::validation("tables", "At least one table is required").into());
    }

    let mut by_source: BTreeMap<String, Vec<RawTable>> = BTreeMap::new();
    for table in request.tables {
        by_source.entry(table.source.source_id.clone()).or_default().push(table);
    }
    let jobs = by_source
        .into_iter()
        .map(|(source_id, tables)| DocumentJob::Tables { source_id, tables })
        .collect();

    Ok(Json(ingest(&state, jobs).await?))
}

async fn ingest(state: &AppState, jobs: Vec<DocumentJob>) -> DealsightResult<IngestResponse> {
    let mut workers = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let pipeline = Arc::clone(&state.pipeline);
        let calculator = Arc::clone(&state.calculator);
        workers.spawn_blocking(move || (index, run_job(&pipeline, calculator.classifier(), job)));
    }

    let mut results = Vec::new();
    while let Some(joined) = workers.join_next().await {
        let (index, result) =
            joined.map_err(|e| DealsightError::internal(format!("extraction worker failed: {}", e)))?;
        results.push((index, result?));
    }
    results.sort_by_key(|(index, _)| *index);

    let mut documents = Vec::with_capacity(results.len());
    let mut records_stored = 0;
    for (_, mut document) in results {
        let records: Vec<_> = document.report.records().cloned().collect();
        document.records_stored = state.store.insert_many(records).await;
        records_stored += document.records_stored;
        info!(
            "Ingested {}: {} record(s), {} failed table(s)",
            document.source_id, document.records_stored, document.tables_failed
        );
        documents.push(document);
    }

    Ok(IngestResponse { documents, records_stored })
}

/// Decode (for spreadsheets), extract and classify one document.
fn run_job(
    pipeline: &ExtractionPipeline,
    classifier: &ClassificationEngine,
    job: DocumentJob,
) -> DealsightResult<DocumentIngestResult> {
    let (source_id, format, warnings, tables) = match job {
        DocumentJob::Spreadsheet { filename, content_type, data } => {
            let format = content_type.as_deref().and_then(SpreadsheetFormat::from_content_type);
            let document = SpreadsheetReader::new()
                .with_ingested_at(Utc::now())
                .read_bytes(&filename, &data, format)?;
            (filename, Some(document.format.as_str().to_string()), document.warnings, document.tables)
        }
        DocumentJob::Tables { source_id, tables } => (source_id, None, Vec::new(), tables),
    };

    let mut report = pipeline.process_document(&source_id, &tables);
    classify_report(&mut report, classifier);

    Ok(DocumentIngestResult {
        source_id,
        format,
        warnings,
        records_stored: 0,
        tables_failed: report.failed_count(),
        report,
    })
}

fn classify_report(report: &mut DocumentReport, classifier: &ClassificationEngine) {
    for outcome in &mut report.tables {
        if let TableOutcome::Extracted(table) = outcome {
            for partition in &mut table.partitions {
                for record in &mut partition.records {
                    classifier.apply(record);
                }
            }
        }
    }
}
