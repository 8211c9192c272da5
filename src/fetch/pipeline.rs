// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Live pipeline driver.
//!
//! One task per active stream key:
//!
//! ```text
//! subscribe to store changes
//! publish cached value (if any)          provisional, first run only
//! refresh from network, publish
//! loop {
//!     poll tick        → refresh from network, publish
//!     relevant change  → debounce, re-read cache, publish if different
//! }
//! ```
//!
//! The task never ends on its own while a poll interval is set or the store
//! is still sending notifications; the multiplexer aborts it when the last
//! observer leaves.

use std::future::pending;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::{Decoder, ModelFetcher};
use crate::error::SyncError;
use crate::metrics;
use crate::model::ModelMeta;
use crate::remote::NetworkError;
use crate::stream::{BroadcastPoint, ResultState, StreamKey, StreamOperation, StreamPayload};

pub(crate) async fn run_pipeline(
    fetcher: Arc<ModelFetcher>,
    key: StreamKey,
    meta: ModelMeta,
    decode: Decoder,
    point: Arc<BroadcastPoint>,
) {
    let model = meta.model_type.name();
    let mut changes = fetcher.store().change_notifications();
    let mut listening = true;
    let mut last_published: Option<ResultState<StreamPayload>> = None;

    let mut publish = |value: ResultState<StreamPayload>, only_if_changed: bool| {
        if only_if_changed && last_published.as_ref() == Some(&value) {
            trace!(key = %key_label(&key), "re-read unchanged");
            return;
        }
        metrics::record_publish(model);
        point.publish(value.clone());
        last_published = Some(value);
    };

    debug!(key = %key_label(&key), "pipeline started");

    match read_cached(&fetcher, &key, &meta).await {
        Ok(Some(payload)) => publish(ResultState::Loaded(payload), false),
        Ok(None) => {}
        Err(e) => debug!(key = %key_label(&key), error = %e, "provisional cache read failed"),
    }
    publish(refresh(&fetcher, &key, &meta, decode).await, false);

    let mut ticker = meta.poll_interval.map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    if ticker.is_none() {
        debug!(key = %key_label(&key), "no poll interval, watching store only");
    }

    let debounce = fetcher.config().change_debounce();

    loop {
        if ticker.is_none() && !listening {
            debug!(key = %key_label(&key), "pipeline finished");
            return;
        }

        tokio::select! {
            _ = next_tick(&mut ticker) => {
                trace!(key = %key_label(&key), "poll tick");
                publish(refresh(&fetcher, &key, &meta, decode).await, false);
            }
            change = changes.recv(), if listening => {
                match change {
                    Ok(change) if !change.is_relevant(meta.model_type, key.watched_id()) => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(key = %key_label(&key), skipped, "store notifications lagged, re-reading");
                    }
                    Err(RecvError::Closed) => {
                        listening = false;
                        continue;
                    }
                }

                // Coalesce the burst a multi-record write produces
                let window = sleep(debounce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        _ = &mut window => break,
                        next = changes.recv() => {
                            if matches!(next, Err(RecvError::Closed)) {
                                listening = false;
                                window.as_mut().await;
                                break;
                            }
                        }
                    }
                }

                match reread(&fetcher, &key, &meta).await {
                    Ok(value) => publish(value, true),
                    Err(e) => warn!(key = %key_label(&key), error = %e, "cache re-read failed"),
                }
            }
        }
    }
}

fn key_label(key: &StreamKey) -> String {
    key.to_string()
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

/// Provisional value: whatever the cache holds right now, if anything.
async fn read_cached(
    fetcher: &ModelFetcher,
    key: &StreamKey,
    meta: &ModelMeta,
) -> Result<Option<StreamPayload>, SyncError> {
    match &key.operation {
        StreamOperation::Model { id } => Ok(fetcher
            .cached_single(meta, Some(id))
            .await?
            .map(StreamPayload::Single)),
        StreamOperation::Singleton => Ok(fetcher
            .cached_single(meta, None)
            .await?
            .map(StreamPayload::Single)),
        StreamOperation::List => {
            let rows = fetcher
                .read_list(meta, key.query.as_ref(), key.limit, &key.sort)
                .await?;
            Ok((!rows.is_empty()).then_some(StreamPayload::List(rows)))
        }
    }
}

/// Network-derived value for the key.
async fn refresh(
    fetcher: &ModelFetcher,
    key: &StreamKey,
    meta: &ModelMeta,
    decode: Decoder,
) -> ResultState<StreamPayload> {
    let result = match &key.operation {
        StreamOperation::Model { id } => fetcher
            .refresh_single(meta, Some(id), decode)
            .await
            .map(StreamPayload::Single),
        StreamOperation::Singleton => fetcher
            .refresh_single(meta, None, decode)
            .await
            .map(StreamPayload::Single),
        StreamOperation::List => fetcher
            .refresh_list(meta, key.query.as_ref(), key.limit, &key.sort, decode)
            .await
            .map(StreamPayload::List),
    };
    if let Err(e) = &result {
        debug!(key = %key_label(key), error = %e, "refresh failed");
    }
    result.into()
}

/// Cache-only value after a store change. A watched record that vanished is not-found.
async fn reread(
    fetcher: &ModelFetcher,
    key: &StreamKey,
    meta: &ModelMeta,
) -> Result<ResultState<StreamPayload>, SyncError> {
    Ok(match read_cached(fetcher, key, meta).await? {
        Some(payload) => ResultState::Loaded(payload),
        None if key.is_list() => ResultState::Loaded(StreamPayload::List(Vec::new())),
        None => ResultState::Error(NetworkError::NotFound.into()),
    })
}
