// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Shared fixtures: sample model types, a scripted remote client, and a
//! failure-injecting store wrapper.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;

use model_sync::query::{Query, QueryParam, SortDescriptor};
use model_sync::{
    ChangeNotification, Endpoint, HeadersProvider, InMemoryStore, Model, ModelMeta, ModelProvider,
    ModelStore, ModelSyncConfig, ModelType, NetworkError, RemoteClient, ResultState,
    StorageError, StoredRecord, Subscription,
};

// =============================================================================
// Sample models
// =============================================================================

/// List + detail type, cached for a minute, `value` remotely filterable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub value: i64,
    #[serde(default)]
    pub name: String,
}

impl Model for Widget {
    const META: ModelMeta = ModelMeta::new("widget")
        .cache_for(Duration::from_secs(60))
        .detail(Endpoint::get("/widgets/{id}/"))
        .list(Endpoint::get("/widgets/"))
        .remote_keys(&[("value", "value")])
        .path_rewrites(&["id"]);

    fn id(&self) -> &str {
        &self.id
    }
}

/// Another shape registered under the same type name as [`Widget`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetLabel {
    pub id: String,
    pub label: String,
}

impl Model for WidgetLabel {
    const META: ModelMeta = Widget::META;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Singleton type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
}

impl Model for Profile {
    const META: ModelMeta = ModelMeta::new("profile")
        .cache_for(Duration::from_secs(60))
        .detail(Endpoint::get("/me/"))
        .singleton();

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fetchable without an id, but not a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
}

impl Model for Feed {
    const META: ModelMeta = ModelMeta::new("feed")
        .cache_for(Duration::from_secs(60))
        .detail(Endpoint::get("/feed/"))
        .default_queryable();

    fn id(&self) -> &str {
        &self.id
    }
}

/// List-only type: no detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
}

impl Model for Article {
    const META: ModelMeta = ModelMeta::new("article")
        .cache_for(Duration::from_secs(60))
        .list(Endpoint::get("/articles/"))
        .remote_keys(&[("id", "id")]);

    fn id(&self) -> &str {
        &self.id
    }
}

/// Polled every ten seconds, never fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub value: i64,
}

impl Model for Reading {
    const META: ModelMeta = ModelMeta::new("reading")
        .poll_every(Duration::from_secs(10))
        .detail(Endpoint::get("/readings/{id}/"))
        .list(Endpoint::get("/readings/"))
        .remote_keys(&[("value", "value")]);

    fn id(&self) -> &str {
        &self.id
    }
}

/// Neither endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orphan {
    pub id: String,
}

impl Model for Orphan {
    const META: ModelMeta = ModelMeta::new("orphan");

    fn id(&self) -> &str {
        &self.id
    }
}

pub fn widget_json(id: &str, value: i64) -> Value {
    json!({"id": id, "value": value, "name": format!("widget {}", id)})
}

// =============================================================================
// Scripted remote client
// =============================================================================

/// Remote client answering from scripted responses and counting calls.
///
/// Unscripted detail requests answer not-found; unscripted lists are empty.
/// Missing endpoints fail the way the JSON client does.
#[derive(Default)]
pub struct MockRemote {
    details: Mutex<HashMap<(ModelType, Option<String>), Result<Value, NetworkError>>>,
    lists: Mutex<HashMap<ModelType, Result<Vec<Value>, NetworkError>>>,
    detail_calls: AtomicUsize,
    list_calls: AtomicUsize,
    completed_calls: AtomicUsize,
    list_params: Mutex<Vec<Option<Vec<QueryParam>>>>,
    headers: Mutex<Option<HeadersProvider>>,
    delay: Mutex<Option<Duration>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_detail(&self, model_type: ModelType, id: Option<&str>, result: Result<Value, NetworkError>) {
        self.details
            .lock()
            .insert((model_type, id.map(str::to_string)), result);
    }

    pub fn set_list(&self, model_type: ModelType, result: Result<Vec<Value>, NetworkError>) {
        self.lists.lock().insert(model_type, result);
    }

    /// Every call sleeps this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion (not cancelled mid-flight)
    pub fn completed_calls(&self) -> usize {
        self.completed_calls.load(Ordering::SeqCst)
    }

    pub fn last_list_params(&self) -> Option<Option<Vec<QueryParam>>> {
        self.list_params.lock().last().cloned()
    }

    pub fn current_headers(&self) -> Option<Vec<(String, String)>> {
        self.headers.lock().as_ref().map(|provider| provider())
    }

    async fn wait(&self) {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn fetch_detail(&self, meta: &ModelMeta, id: Option<&str>) -> Result<Value, NetworkError> {
        if meta.detail.is_none() {
            return Err(NetworkError::DetailEndpointMissing);
        }
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.completed_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .get(&(meta.model_type, id.map(str::to_string)))
            .cloned()
            .unwrap_or(Err(NetworkError::NotFound))
    }

    async fn fetch_list(
        &self,
        meta: &ModelMeta,
        params: Option<&[QueryParam]>,
    ) -> Result<Vec<Value>, NetworkError> {
        if meta.list.is_none() {
            return Err(NetworkError::ListEndpointMissing);
        }
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_params.lock().push(params.map(<[QueryParam]>::to_vec));
        self.wait().await;
        self.completed_calls.fetch_add(1, Ordering::SeqCst);
        self.lists
            .lock()
            .get(&meta.model_type)
            .cloned()
            .unwrap_or(Ok(Vec::new()))
    }

    fn set_headers_provider(&self, provider: Option<HeadersProvider>) {
        *self.headers.lock() = provider;
    }
}

// =============================================================================
// Failing store wrapper - precise error injection
// =============================================================================

/// Wraps a store and fails selected operations on demand.
pub struct FailingStore<S: ModelStore> {
    pub inner: S,
    fail_deletes: AtomicBool,
    fail_fetches: AtomicBool,
}

impl<S: ModelStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_deletes: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Backend("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: ModelStore> ModelStore for FailingStore<S> {
    async fn fetch(
        &self,
        model_type: ModelType,
        filter: Option<&Query>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<StoredRecord>, StorageError> {
        Self::check(&self.fail_fetches)?;
        self.inner.fetch(model_type, filter, sort).await
    }

    async fn save(&self, record: &StoredRecord) -> Result<(), StorageError> {
        self.inner.save(record).await
    }

    async fn save_batch(&self, records: &[StoredRecord]) -> Result<(), StorageError> {
        self.inner.save_batch(records).await
    }

    async fn delete(&self, model_type: ModelType, filter: &Query) -> Result<usize, StorageError> {
        Self::check(&self.fail_deletes)?;
        self.inner.delete(model_type, filter).await
    }

    async fn delete_all(&self, model_type: ModelType) -> Result<(), StorageError> {
        Self::check(&self.fail_deletes)?;
        self.inner.delete_all(model_type).await
    }

    fn change_notifications(&self) -> broadcast::Receiver<ChangeNotification> {
        self.inner.change_notifications()
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn provider_with(store: Arc<dyn ModelStore>, remote: Arc<MockRemote>) -> ModelProvider {
    init_tracing();
    ModelProvider::new(store, remote, ModelSyncConfig::default())
}

/// Store a record as if an earlier fetch had cached it at `cached_at`.
pub async fn seed<T: Model>(store: &dyn ModelStore, model: &T, cached_at: Option<i64>) {
    let mut record = StoredRecord::from_model(model).unwrap();
    record.last_cached_at = cached_at;
    store.save(&record).await.unwrap();
}

pub async fn cached_ids(store: &dyn ModelStore, model_type: ModelType) -> Vec<String> {
    let mut ids: Vec<String> = store
        .fetch(model_type, None, &[])
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();
    ids
}

pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

pub fn memory_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

/// Next emitted state. Panics if the stream ends or stays silent for a minute.
pub async fn next_state<T>(sub: &mut Subscription<T>) -> ResultState<T> {
    tokio::time::timeout(Duration::from_secs(60), sub.next())
        .await
        .expect("stream stayed silent")
        .expect("stream ended")
}

/// Next state that is not `Loading`.
pub async fn next_settled<T>(sub: &mut Subscription<T>) -> ResultState<T> {
    loop {
        let state = next_state(sub).await;
        if !state.is_loading() {
            return state;
        }
    }
}

/// Ids of a loaded widget list, panicking on any other state.
pub fn loaded_ids<T: Model>(state: &ResultState<Vec<T>>) -> Vec<String> {
    match state {
        ResultState::Loaded(items) => items.iter().map(|m| m.id().to_string()).collect(),
        other => panic!("expected loaded list, got {:?}", other.error()),
    }
}
