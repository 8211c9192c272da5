// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use super::traits::{ChangeNotification, ModelStore, StorageError};
use crate::config::ModelSyncConfig;
use crate::model::{ModelType, StoredRecord};
use crate::query::{sort_records, Query, SortDescriptor};

/// Process-local [`ModelStore`] keyed by (type, id).
pub struct InMemoryStore {
    data: DashMap<(ModelType, String), StoredRecord>,
    changes: broadcast::Sender<ChangeNotification>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&ModelSyncConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &ModelSyncConfig) -> Self {
        let (changes, _) = broadcast::channel(config.notification_buffer.max(1));
        Self {
            data: DashMap::new(),
            changes,
        }
    }

    /// Get current record count across all types
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record count for one type
    #[must_use]
    pub fn count(&self, model_type: ModelType) -> usize {
        self.data.iter().filter(|e| e.key().0 == model_type).count()
    }

    fn notify(&self, change: ChangeNotification) {
        trace!(?change, "store change");
        // No receivers is fine
        let _ = self.changes.send(change);
    }

    fn matching_ids(&self, model_type: ModelType, filter: Option<&Query>) -> Vec<String> {
        self.data
            .iter()
            .filter(|e| e.key().0 == model_type)
            .filter(|e| filter.map_or(true, |q| q.matches(e.value())))
            .map(|e| e.key().1.clone())
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelStore for InMemoryStore {
    async fn fetch(
        &self,
        model_type: ModelType,
        filter: Option<&Query>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let mut records: Vec<StoredRecord> = self
            .data
            .iter()
            .filter(|e| e.key().0 == model_type)
            .filter(|e| filter.map_or(true, |q| q.matches(e.value())))
            .map(|e| e.value().clone())
            .collect();
        sort_records(&mut records, sort);
        Ok(records)
    }

    async fn save(&self, record: &StoredRecord) -> Result<(), StorageError> {
        self.data
            .insert((record.model_type, record.id.clone()), record.clone());
        self.notify(ChangeNotification::Updated {
            model_type: record.model_type,
            ids: vec![record.id.clone()],
        });
        Ok(())
    }

    async fn save_batch(&self, records: &[StoredRecord]) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        for record in records {
            self.data
                .insert((record.model_type, record.id.clone()), record.clone());
        }
        // One notification per type touched
        let mut types: Vec<ModelType> = records.iter().map(|r| r.model_type).collect();
        types.sort();
        types.dedup();
        for model_type in types {
            let ids = records
                .iter()
                .filter(|r| r.model_type == model_type)
                .map(|r| r.id.clone())
                .collect();
            self.notify(ChangeNotification::Updated { model_type, ids });
        }
        Ok(())
    }

    async fn delete(&self, model_type: ModelType, filter: &Query) -> Result<usize, StorageError> {
        let ids = self.matching_ids(model_type, Some(filter));
        let removed: Vec<String> = ids
            .into_iter()
            .filter(|id| self.data.remove(&(model_type, id.clone())).is_some())
            .collect();
        let count = removed.len();
        if count > 0 {
            self.notify(ChangeNotification::Deleted { model_type, ids: removed });
        }
        Ok(count)
    }

    async fn delete_all(&self, model_type: ModelType) -> Result<(), StorageError> {
        self.data.retain(|key, _| key.0 != model_type);
        self.notify(ChangeNotification::AllDeleted { model_type });
        Ok(())
    }

    fn change_notifications(&self) -> broadcast::Receiver<ChangeNotification> {
        self.changes.subscribe()
    }
}
