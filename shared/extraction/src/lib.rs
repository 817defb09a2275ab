//! # Dealsight Extraction
//! 
//! Document-to-record pipeline: tabular input from a document-conversion
//! collaborator becomes validated, entity-attributed inventory records.
//! 
//! ## Stages
//! 
//! - **unicode**: text canonicalization applied to every header and cell
//! - **structure**: merged headers, stacked headers, continuation rows
//! - **header_mapper**: canonical field assignment with confidence
//! - **quality**: per-table extraction quality score
//! - **entity_resolver**: target / acquirer attribution, per-row splitting
//! - **record_builder**: validated records, review flags, legacy policy
//! - **pipeline**: per-table and per-document driver

pub mod cells;
pub mod entity_resolver;
pub mod header_mapper;
pub mod pipeline;
pub mod quality;
pub mod record_builder;
pub mod structure;
pub mod unicode;

pub use entity_resolver::EntityResolver;
pub use header_mapper::HeaderMapper;
pub use pipeline::{DocumentReport, ExtractionPipeline, PartitionReport, TableOutcome, TableReport};
pub use quality::QualityScorer;
pub use record_builder::{BuildOutcome, RecordBuilder};
pub use structure::{TableLayout, TableNormalizer};
pub use unicode::{comparison_key, normalize_text};
