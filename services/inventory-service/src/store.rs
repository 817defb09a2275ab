//! In-memory record store.

use dealsight_costing::ClassificationEngine;
use dealsight_models::{Entity, InventoryRecord, RecordCorrection};
use dealsight_utils::{DealsightError, DealsightResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    pub entity: Option<Entity>,
    pub needs_review: Option<bool>,
}

impl RecordFilter {
    fn matches(&self, record: &InventoryRecord) -> bool {
        self.entity.map_or(true, |e| record.entity == e)
            && self.needs_review.map_or(true, |r| record.needs_review == r)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<RwLock<HashMap<Uuid, InventoryRecord>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_many(&self, records: impl IntoIterator<Item = InventoryRecord>) -> usize {
        let mut store = self.records.write().await;
        let mut inserted = 0;
        for record in records {
            store.insert(record.id, record);
            inserted += 1;
        }
        inserted
    }

    pub async fn get(&self, id: Uuid) -> Option<InventoryRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// Matching records, oldest first then by name.
    pub async fn list(&self, filter: RecordFilter) -> Vec<InventoryRecord> {
        let store = self.records.read().await;
        let mut records: Vec<InventoryRecord> = store.values().filter(|r| filter.matches(r)).cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        records
    }

    /// Corrects a record and re-derives its inferred classification under
    /// the same lock.
    pub async fn apply_correction(
        &self,
        id: Uuid,
        correction: RecordCorrection,
        classifier: &ClassificationEngine,
    ) -> DealsightResult<InventoryRecord> {
        let mut store = self.records.write().await;
        let record = store
            .get_mut(&id)
            .ok_or_else(|| DealsightError::not_found(format!("record {}", id)))?;
        record.apply_correction(correction);
        classifier.apply(record);
        Ok(record.clone())
    }
}
