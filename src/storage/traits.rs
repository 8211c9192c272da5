// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::model::{ModelType, StoredRecord};
use crate::query::{Query, SortDescriptor};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Item not found")]
    NotFound,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A committed change to the persistent store.
///
/// Batched: one notification per write call, not per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotification {
    Updated { model_type: ModelType, ids: Vec<String> },
    Deleted { model_type: ModelType, ids: Vec<String> },
    AllDeleted { model_type: ModelType },
}

impl ChangeNotification {
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            ChangeNotification::Updated { model_type, .. }
            | ChangeNotification::Deleted { model_type, .. }
            | ChangeNotification::AllDeleted { model_type } => *model_type,
        }
    }

    /// Whether a watcher of `model_type` (optionally a single `id`) should react.
    ///
    /// Type-wide watchers react to every change of their type; id watchers only
    /// to changes naming their id or clearing the whole type.
    #[must_use]
    pub fn is_relevant(&self, model_type: ModelType, id: Option<&str>) -> bool {
        if self.model_type() != model_type {
            return false;
        }
        match (self, id) {
            (_, None) | (ChangeNotification::AllDeleted { .. }, _) => true,
            (ChangeNotification::Updated { ids, .. }, Some(id))
            | (ChangeNotification::Deleted { ids, .. }, Some(id)) => ids.iter().any(|i| i == id),
        }
    }
}

/// Persistent store of type-erased records.
///
/// Implementations must be read-after-write consistent and must publish a
/// [`ChangeNotification`] after every write that changed something.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Records of `model_type` matching `filter` (all when `None`), ordered by `sort`
    /// and then by `list_position`, then `id`.
    async fn fetch(
        &self,
        model_type: ModelType,
        filter: Option<&Query>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<StoredRecord>, StorageError>;

    /// Insert or replace by (type, id).
    async fn save(&self, record: &StoredRecord) -> Result<(), StorageError>;

    /// Delete records of `model_type` matching `filter`. Returns how many were removed.
    async fn delete(&self, model_type: ModelType, filter: &Query) -> Result<usize, StorageError>;

    async fn delete_all(&self, model_type: ModelType) -> Result<(), StorageError>;

    fn change_notifications(&self) -> broadcast::Receiver<ChangeNotification>;

    /// Save several records.
    /// Default implementation falls back to sequential saves.
    async fn save_batch(&self, records: &[StoredRecord]) -> Result<(), StorageError> {
        for record in records {
            self.save(record).await?;
        }
        Ok(())
    }
}
