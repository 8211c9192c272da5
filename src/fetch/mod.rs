// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fetch Orchestrator
//!
//! Combines the persistent store and the remote client into the authoritative
//! value for a single record, a singleton, or a query.
//!
//! # Flow
//!
//! ```text
//! single / singleton                     list
//! ──────────────────                     ────
//! cache (fresh?) ──yes──► return         cache (limited?) ──yes──► return
//!      │ no                                   │ no
//!      ▼                                      ▼
//! fetch_detail                           fetch_list(remote params | unfiltered)
//!      │ ok        │ not-found                │ ok
//!      ▼           ▼                          ▼
//! stamp + save   purge id (or type)      reconcile (upsert, delete stale)
//!      │         return NotFound              │
//!      ▼                                      ▼
//! re-read from store                     re-read, sort, limit
//! ```
//!
//! The typed entry points (`get_*`) decode the committed rows into the
//! caller's [`Model`]. The erased layer underneath works on
//! [`StoredRecord`]s and is shared with the live pipelines.

mod pipeline;
mod reconcile;

pub(crate) use pipeline::run_pipeline;
pub use reconcile::{reconcile_list, ReconcileOutcome};

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ModelSyncConfig;
use crate::error::SyncError;
use crate::metrics::{self, LatencyTimer};
use crate::model::{now_millis, Model, ModelMeta, StoredRecord};
use crate::query::{Query, SortDescriptor};
use crate::remote::{NetworkError, RemoteClient};
use crate::storage::{ModelStore, StorageError};
use crate::stream::types::decode_record;

/// Decodes a remote JSON payload as a specific model type and erases it.
pub type Decoder = fn(Value) -> Result<StoredRecord, NetworkError>;

/// The Fetch Orchestrator.
pub struct ModelFetcher {
    store: Arc<dyn ModelStore>,
    remote: Arc<dyn RemoteClient>,
    config: ModelSyncConfig,
}

impl ModelFetcher {
    pub fn new(store: Arc<dyn ModelStore>, remote: Arc<dyn RemoteClient>, config: ModelSyncConfig) -> Self {
        Self { store, remote, config }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ModelStore> {
        &self.store
    }

    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteClient> {
        &self.remote
    }

    #[must_use]
    pub fn config(&self) -> &ModelSyncConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Typed one-shot API
    // ═══════════════════════════════════════════════════════════════════════

    /// One record by id. A fresh cached copy is returned without touching the network.
    #[instrument(skip(self), fields(model = %T::META.model_type))]
    pub async fn get_model<T: Model>(&self, id: &str) -> Result<T, SyncError> {
        let record = self
            .load_single(&T::META, Some(id), StoredRecord::decode::<T>)
            .await?;
        decode_record::<T>(record)
    }

    /// The single instance of a singleton or default-queryable type.
    #[instrument(skip(self), fields(model = %T::META.model_type))]
    pub async fn get_singleton<T: Model>(&self) -> Result<T, SyncError> {
        let record = self
            .load_single(&T::META, None, StoredRecord::decode::<T>)
            .await?;
        decode_record::<T>(record)
    }

    /// Records matching `query` (all when `None`), sorted, at most `limit`.
    #[instrument(skip(self, sort), fields(model = %T::META.model_type))]
    pub async fn get_list<T: Model>(
        &self,
        query: Option<&Query>,
        limit: Option<usize>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<T>, SyncError> {
        let records = self
            .load_list(&T::META, query, limit, sort, StoredRecord::decode::<T>)
            .await?;
        records.into_iter().map(decode_record::<T>).collect()
    }

    /// First record of the list. An empty result is not-found.
    #[instrument(skip(self, sort), fields(model = %T::META.model_type))]
    pub async fn get_first<T: Model>(
        &self,
        query: Option<&Query>,
        sort: &[SortDescriptor],
    ) -> Result<T, SyncError> {
        let records = self
            .load_list(&T::META, query, Some(1), sort, StoredRecord::decode::<T>)
            .await?;
        match records.into_iter().next() {
            Some(record) => decode_record::<T>(record),
            None => Err(NetworkError::NotFound.into()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Erased layer
    // ═══════════════════════════════════════════════════════════════════════

    async fn load_single(
        &self,
        meta: &ModelMeta,
        id: Option<&str>,
        decode: Decoder,
    ) -> Result<StoredRecord, SyncError> {
        ensure_single_supported(meta, id)?;
        let model = meta.model_type.name();
        match self.cached_single(meta, id).await? {
            Some(cached) if cached.is_fresh(meta.cache_duration, now_millis()) => {
                debug!("cache hit");
                metrics::record_cache_lookup(model, "hit");
                return Ok(cached);
            }
            Some(_) => metrics::record_cache_lookup(model, "stale"),
            None => metrics::record_cache_lookup(model, "miss"),
        }
        self.refresh_single(meta, id, decode).await
    }

    async fn load_list(
        &self,
        meta: &ModelMeta,
        query: Option<&Query>,
        limit: Option<usize>,
        sort: &[SortDescriptor],
        decode: Decoder,
    ) -> Result<Vec<StoredRecord>, SyncError> {
        let model = meta.model_type.name();
        let cached = self.read_list(meta, query, limit, sort).await?;
        if cache_trusted(meta, query, limit, &cached) {
            debug!(count = cached.len(), "cache hit");
            metrics::record_cache_lookup(model, "hit");
            return Ok(cached);
        }
        metrics::record_cache_lookup(model, if cached.is_empty() { "miss" } else { "stale" });
        self.refresh_list(meta, query, limit, sort, decode).await
    }

    /// Cached row for an id, or the (first) cached instance when `id` is `None`.
    pub(crate) async fn cached_single(
        &self,
        meta: &ModelMeta,
        id: Option<&str>,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let filter = id.map(Query::id);
        let rows = self.store.fetch(meta.model_type, filter.as_ref(), &[]).await?;
        Ok(rows.into_iter().next())
    }

    /// Cached rows matching `query`, sorted, truncated to `limit`.
    pub(crate) async fn read_list(
        &self,
        meta: &ModelMeta,
        query: Option<&Query>,
        limit: Option<usize>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let mut rows = self.store.fetch(meta.model_type, query, sort).await?;
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    /// Network round trip for one record, committed to the store and read back.
    pub(crate) async fn refresh_single(
        &self,
        meta: &ModelMeta,
        id: Option<&str>,
        decode: Decoder,
    ) -> Result<StoredRecord, SyncError> {
        ensure_single_supported(meta, id)?;

        // List-only types serve single records through the list endpoint
        if let (Some(id), None) = (id, meta.detail) {
            if meta.list.is_none() {
                return Err(NetworkError::DetailEndpointMissing.into());
            }
            let query = Query::id(id);
            let rows = self.refresh_list(meta, Some(&query), Some(1), &[], decode).await?;
            return rows
                .into_iter()
                .next()
                .ok_or_else(|| NetworkError::NotFound.into());
        }

        let model = meta.model_type.name();
        let result = {
            let _timer = LatencyTimer::new(model, "detail");
            self.remote.fetch_detail(meta, id).await
        };
        metrics::record_fetch(model, "detail", metrics::fetch_status(&result));

        let record = match result.and_then(decode) {
            Ok(record) => record,
            Err(NetworkError::NotFound) => {
                self.purge_not_found(meta, id).await;
                return Err(NetworkError::NotFound.into());
            }
            Err(e) => return Err(e.into()),
        };

        // Keep the list ordering a previous list fetch assigned
        let list_position = self
            .cached_single(meta, Some(&record.id))
            .await?
            .and_then(|existing| existing.list_position);
        let record = record.stamped(now_millis(), list_position);

        // Never two singleton instances at once, even between writes
        if id.is_none() && meta.singleton {
            self.remove_other_instances(meta, &record.id).await?;
        }
        self.store.save(&record).await?;

        self.cached_single(meta, Some(&record.id))
            .await?
            .ok_or(SyncError::Storage(StorageError::NotFound))
    }

    /// Network round trip for a list, reconciled into the store and read back.
    pub(crate) async fn refresh_list(
        &self,
        meta: &ModelMeta,
        query: Option<&Query>,
        limit: Option<usize>,
        sort: &[SortDescriptor],
        decode: Decoder,
    ) -> Result<Vec<StoredRecord>, SyncError> {
        let model = meta.model_type.name();
        let params = query.and_then(|q| q.remote_params(meta));
        let result = {
            let _timer = LatencyTimer::new(model, "list");
            self.remote.fetch_list(meta, params.as_deref()).await
        };
        metrics::record_fetch(model, "list", metrics::fetch_status(&result));

        let fetched = result?
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        reconcile_list(self.store.as_ref(), meta, query, fetched, now_millis()).await?;
        Ok(self.read_list(meta, query, limit, sort).await?)
    }

    async fn purge_not_found(&self, meta: &ModelMeta, id: Option<&str>) {
        let model_type = meta.model_type;
        let result = match id {
            Some(id) => self.store.delete(model_type, &Query::id(id)).await.map(|_| ()),
            None => self.store.delete_all(model_type).await,
        };
        match result {
            Ok(()) => debug!(model = %model_type, ?id, "purged record reported missing upstream"),
            Err(e) => {
                warn!(model = %model_type, ?id, error = %e, "Failed to purge record reported missing upstream");
                metrics::record_housekeeping_error(model_type.name(), "not_found_purge");
            }
        }
    }

    async fn remove_other_instances(&self, meta: &ModelMeta, keep: &str) -> Result<(), StorageError> {
        let others: Vec<String> = self
            .store
            .fetch(meta.model_type, None, &[])
            .await?
            .into_iter()
            .map(|r| r.id)
            .filter(|id| id != keep)
            .collect();
        if !others.is_empty() {
            self.store.delete(meta.model_type, &Query::id_in(others)).await?;
        }
        Ok(())
    }
}

/// Id-less retrieval needs a singleton or default-queryable type.
fn ensure_single_supported(meta: &ModelMeta, id: Option<&str>) -> Result<(), SyncError> {
    if id.is_none() && !(meta.singleton || meta.default_queryable) {
        return Err(SyncError::UnsupportedOperation {
            model_type: meta.model_type,
            operation: "get_singleton",
        });
    }
    Ok(())
}

/// Whether a one-shot list read may skip the network.
///
/// Only a limited read can be answered locally: fresh rows prove nothing about
/// completeness, but `limit` fresh matches satisfy the request whatever else
/// the server holds. OR queries always go remote.
fn cache_trusted(
    meta: &ModelMeta,
    query: Option<&Query>,
    limit: Option<usize>,
    cached: &[StoredRecord],
) -> bool {
    let Some(limit) = limit else {
        return false;
    };
    if limit == 0 || query.map_or(false, Query::contains_or) || cached.len() < limit {
        return false;
    }
    let now = now_millis();
    cached.iter().all(|r| r.is_fresh(meta.cache_duration, now))
}
