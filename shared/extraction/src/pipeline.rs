//! Per-table and per-document extraction driver.
//!
//! Each table runs normalize -> map -> score -> resolve -> (split) -> build
//! on its own. A failing table is reported and never affects the others.

use dealsight_models::{
    CanonicalField, Entity, EntityResolution, EntitySignal, EntityTag, FieldMapping, InventoryRecord,
    NormalizedTable, RawTable, SignalSource, SignalStrength,
};
use dealsight_utils::{DealsightError, DealsightResult, ExtractionConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity_resolver::{EntityResolver, ENTITY_COLUMN_CONFIDENCE};
use crate::header_mapper::HeaderMapper;
use crate::quality::QualityScorer;
use crate::record_builder::RecordBuilder;
use crate::structure::TableNormalizer;

/// Stateless after construction; share one instance across workers.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    normalizer: TableNormalizer,
    mapper: HeaderMapper,
    scorer: QualityScorer,
    resolver: EntityResolver,
    builder: RecordBuilder,
}

/// Records built for one entity of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub table_id: Uuid,
    pub entity: Entity,
    pub entity_confidence: f64,
    pub extraction_quality: f64,
    pub mapping: FieldMapping,
    pub records: Vec<InventoryRecord>,
    pub skipped_rows: Vec<usize>,
    pub rejected_rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub raw_table_id: Uuid,
    pub source_id: String,
    /// One partition, or one per entity when the table was split
    pub partitions: Vec<PartitionReport>,
    pub warnings: Vec<String>,
}

impl TableReport {
    pub fn records(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.partitions.iter().flat_map(|p| p.records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.partitions.iter().map(|p| p.records.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    Extracted(TableReport),
    Failed {
        raw_table_id: Uuid,
        source_id: String,
        error: DealsightError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source_id: String,
    pub tables: Vec<TableOutcome>,
}

impl DocumentReport {
    pub fn records(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.tables
            .iter()
            .filter_map(|outcome| match outcome {
                TableOutcome::Extracted(report) => Some(report),
                TableOutcome::Failed { .. } => None,
            })
            .flat_map(|report| report.records())
    }

    pub fn into_records(self) -> Vec<InventoryRecord> {
        self.tables
            .into_iter()
            .filter_map(|outcome| match outcome {
                TableOutcome::Extracted(report) => Some(report.partitions),
                TableOutcome::Failed { .. } => None,
            })
            .flatten()
            .flat_map(|p| p.records)
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| matches!(t, TableOutcome::Failed { .. }))
            .count()
    }
}

impl ExtractionPipeline {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            normalizer: TableNormalizer::new(config),
            mapper: HeaderMapper::new(config),
            scorer: QualityScorer::new(),
            resolver: EntityResolver::new(&config.entity_keywords),
            builder: RecordBuilder::new(config),
        }
    }

    pub fn mapper(&self) -> &HeaderMapper {
        &self.mapper
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Normalized table with its quality score, and the mapping it was
    /// scored against.
    pub fn normalize(&self, raw: &RawTable) -> (NormalizedTable, FieldMapping) {
        let layout = self.normalizer.layout(raw);
        let mapping = self.mapper.map_headers(&layout.headers);
        let key_column = mapping.column(CanonicalField::Application).unwrap_or(0);

        let table = layout.into_table(raw.id, raw.source.clone(), key_column);
        let quality = self.scorer.score(&mapping, &table);
        (table.with_quality(quality), mapping)
    }

    pub fn process_table(&self, raw: &RawTable) -> DealsightResult<TableReport> {
        let (table, mapping) = self.normalize(raw);
        let resolution = self.resolver.resolve(&table, &mapping)?;

        let mut warnings = table.warnings().to_vec();
        let partitions = match resolution.tag {
            EntityTag::PerRow { column } => {
                let evidence = table.headers()[column].clone();
                let mut partitions = Vec::new();
                for (entity, part) in self.resolver.split_by_entity(&table, column)? {
                    // Dropping the entity column changes both terms of the score
                    let mapping = self.mapper.map_headers(part.headers());
                    let quality = self.scorer.score(&mapping, &part);
                    let part = part.with_quality(quality);
                    let signal = EntitySignal {
                        source: SignalSource::EntityColumn,
                        entity,
                        strength: SignalStrength::High,
                        evidence: evidence.clone(),
                    };
                    let resolution = EntityResolution::resolved(entity, ENTITY_COLUMN_CONFIDENCE, vec![signal]);
                    partitions.push(self.build_partition(&part, mapping, &resolution, &mut warnings)?);
                }
                partitions
            }
            _ => vec![self.build_partition(&table, mapping, &resolution, &mut warnings)?],
        };

        let report = TableReport {
            raw_table_id: raw.id,
            source_id: raw.source.source_id.clone(),
            partitions,
            warnings,
        };
        info!(
            "Processed table {} from {}: {} record(s) in {} partition(s)",
            raw.id,
            report.source_id,
            report.record_count(),
            report.partitions.len()
        );
        Ok(report)
    }

    /// Tables of one document, processed independently in order.
    pub fn process_document(&self, source_id: &str, tables: &[RawTable]) -> DocumentReport {
        let outcomes = tables
            .iter()
            .map(|raw| match self.process_table(raw) {
                Ok(report) => TableOutcome::Extracted(report),
                Err(error) => {
                    warn!("Table {} from {} failed: {}", raw.id, raw.source.source_id, error);
                    TableOutcome::Failed {
                        raw_table_id: raw.id,
                        source_id: raw.source.source_id.clone(),
                        error,
                    }
                }
            })
            .collect();

        DocumentReport {
            source_id: source_id.to_string(),
            tables: outcomes,
        }
    }

    fn build_partition(
        &self,
        table: &NormalizedTable,
        mapping: FieldMapping,
        resolution: &EntityResolution,
        warnings: &mut Vec<String>,
    ) -> DealsightResult<PartitionReport> {
        let outcome = self.builder.build(table, &mapping, resolution)?;
        warnings.extend(outcome.warnings);

        Ok(PartitionReport {
            table_id: table.id(),
            entity: outcome.entity,
            entity_confidence: outcome.entity_confidence,
            extraction_quality: table.extraction_quality(),
            mapping,
            records: outcome.records,
            skipped_rows: outcome.skipped_rows,
            rejected_rows: outcome.rejected_rows,
        })
    }
}
