// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! List reconciliation.
//!
//! Merges a successful list response into the cache:
//!
//! ```text
//! stale  = ids cached for the type that match the local predicate
//! upsert = every response record, stamped, list_position = response index
//! delete = stale - response ids          (best effort)
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::metrics;
use crate::model::{ModelMeta, StoredRecord};
use crate::query::Query;
use crate::storage::{ModelStore, StorageError};

/// Counts from one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    pub upserted: usize,
    pub deleted: usize,
}

/// Reconcile `fetched` (in response order) against what the cache holds for `query`.
///
/// Upsert failures abort and are returned. Failures deleting stale rows are
/// logged and swallowed: the next successful refresh removes them.
pub async fn reconcile_list(
    store: &dyn ModelStore,
    meta: &ModelMeta,
    query: Option<&Query>,
    fetched: Vec<StoredRecord>,
    now_ms: i64,
) -> Result<ReconcileOutcome, StorageError> {
    let model_type = meta.model_type;
    let mut stale: HashSet<String> = store
        .fetch(model_type, query, &[])
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let records: Vec<StoredRecord> = fetched
        .into_iter()
        .enumerate()
        .map(|(position, record)| {
            stale.remove(&record.id);
            record.stamped(now_ms, Some(position))
        })
        .collect();
    store.save_batch(&records).await?;

    let mut outcome = ReconcileOutcome {
        upserted: records.len(),
        deleted: 0,
    };

    if !stale.is_empty() {
        let mut ids: Vec<String> = stale.into_iter().collect();
        ids.sort();
        match store.delete(model_type, &Query::id_in(ids)).await {
            Ok(deleted) => outcome.deleted = deleted,
            Err(e) => {
                warn!(model = %model_type, error = %e, "Failed to delete records missing from list response");
                metrics::record_housekeeping_error(model_type.name(), "reconcile_delete");
            }
        }
    }

    debug!(model = %model_type, upserted = outcome.upserted, deleted = outcome.deleted, "list reconciled");
    metrics::record_reconcile(model_type.name(), outcome.upserted, outcome.deleted);
    Ok(outcome)
}
