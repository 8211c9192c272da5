// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{info, warn};

use super::broadcast::BroadcastPoint;
use super::key::StreamKey;
use super::types::{ResultState, StreamPayload};
use crate::error::SyncError;
use crate::fetch::{run_pipeline, Decoder, ModelFetcher};
use crate::metrics;
use crate::model::ModelMeta;

struct ActiveStream {
    point: Arc<BroadcastPoint>,
    observers: usize,
    task: JoinHandle<()>,
}

/// Subscription table. All reads and writes go through one lock.
#[derive(Default)]
struct StreamRegistry {
    table: Mutex<HashMap<StreamKey, ActiveStream>>,
}

impl StreamRegistry {
    fn release(&self, key: &StreamKey) {
        let mut table = self.table.lock();
        let Some(entry) = table.get_mut(key) else {
            return;
        };
        entry.observers = entry.observers.saturating_sub(1);
        if entry.observers > 0 {
            return;
        }
        if let Some(entry) = table.remove(key) {
            entry.task.abort();
            info!(key = %key, "stream torn down");
            metrics::record_teardown(key.model_type.name());
            metrics::set_active_streams(table.len());
        }
    }
}

/// Ensures one pipeline per [`StreamKey`] and fans its values out.
///
/// Each [`Subscription`] counts as one observer. Dropping the last one aborts
/// the pipeline and forgets its last value.
#[derive(Clone)]
pub struct StreamMultiplexer {
    fetcher: Arc<ModelFetcher>,
    registry: Arc<StreamRegistry>,
}

impl StreamMultiplexer {
    pub fn new(fetcher: Arc<ModelFetcher>) -> Self {
        Self {
            fetcher,
            registry: Arc::new(StreamRegistry::default()),
        }
    }

    /// Attach to the pipeline for `key`, starting it if needed.
    ///
    /// Outside a Tokio runtime no pipeline can run: the subscription yields a
    /// single [`SyncError::NoRuntime`] and ends.
    pub(crate) fn subscribe<T>(
        &self,
        key: StreamKey,
        meta: ModelMeta,
        decode: Decoder,
        project: fn(ResultState<StreamPayload>) -> ResultState<T>,
    ) -> Subscription<T> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(key = %key, "stream requested outside a Tokio runtime");
            return Subscription::detached(ResultState::Error(SyncError::NoRuntime), project);
        };

        let mut table = self.registry.table.lock();
        let (initial, receiver) = match table.get_mut(&key) {
            Some(entry) => {
                entry.observers += 1;
                metrics::record_subscribe(key.model_type.name(), true);
                entry.point.attach()
            }
            None => {
                let point = Arc::new(BroadcastPoint::new(self.fetcher.config().stream_buffer));
                // Attach before the pipeline can publish anything
                let attached = point.attach();
                let task = runtime.spawn(run_pipeline(
                    self.fetcher.clone(),
                    key.clone(),
                    meta,
                    decode,
                    point.clone(),
                ));
                table.insert(key.clone(), ActiveStream { point, observers: 1, task });
                info!(key = %key, "stream started");
                metrics::record_subscribe(key.model_type.name(), false);
                metrics::set_active_streams(table.len());
                attached
            }
        };
        drop(table);

        Subscription {
            initial: Some(initial),
            inner: BroadcastStream::new(receiver),
            project,
            guard: ObserverGuard {
                registry: self.registry.clone(),
                key: Some(key),
            },
        }
    }

    /// Current observer count for `key` (0 when no pipeline is active).
    #[must_use]
    pub fn observer_count(&self, key: &StreamKey) -> usize {
        self.registry
            .table
            .lock()
            .get(key)
            .map_or(0, |entry| entry.observers)
    }

    /// Number of live pipelines.
    #[must_use]
    pub fn active_streams(&self) -> usize {
        self.registry.table.lock().len()
    }

    /// Keys of all live pipelines.
    #[must_use]
    pub fn active_keys(&self) -> Vec<StreamKey> {
        self.registry.table.lock().keys().cloned().collect()
    }
}

struct ObserverGuard {
    registry: Arc<StreamRegistry>,
    key: Option<StreamKey>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.registry.release(&key);
        }
    }
}

/// One observer of a live stream.
///
/// Yields the stream's current value first, then every later value. Dropping
/// it detaches the observer.
pub struct Subscription<T> {
    initial: Option<ResultState<StreamPayload>>,
    inner: BroadcastStream<ResultState<StreamPayload>>,
    project: fn(ResultState<StreamPayload>) -> ResultState<T>,
    guard: ObserverGuard,
}

impl<T> Subscription<T> {
    /// A subscription attached to no pipeline: yields `value` once, then ends.
    fn detached(
        value: ResultState<StreamPayload>,
        project: fn(ResultState<StreamPayload>) -> ResultState<T>,
    ) -> Self {
        let (_, receiver) = tokio::sync::broadcast::channel(1);
        Self {
            initial: Some(value),
            inner: BroadcastStream::new(receiver),
            project,
            guard: ObserverGuard {
                registry: Arc::new(StreamRegistry::default()),
                key: None,
            },
        }
    }

    /// Key of the pipeline this observer is attached to.
    #[must_use]
    pub fn key(&self) -> Option<&StreamKey> {
        self.guard.key.as_ref()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = ResultState<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(initial) = this.initial.take() {
            return Poll::Ready(Some((this.project)(initial)));
        }
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => return Poll::Ready(Some((this.project)(value))),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "stream observer lagged, skipping to newer values");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
