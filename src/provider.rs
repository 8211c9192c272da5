// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Application-facing facade.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use model_sync::{
//!     Endpoint, InMemoryStore, JsonRemoteClient, Model, ModelMeta, ModelProvider,
//!     ModelSyncConfig, NetworkError, RemoteRequest, RemoteResponse, ResultState, Transport,
//! };
//! use model_sync::query::Query;
//! use serde::{Deserialize, Serialize};
//! use tokio_stream::StreamExt;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Ticket {
//!     id: String,
//!     status: String,
//! }
//!
//! impl Model for Ticket {
//!     const META: ModelMeta = ModelMeta::new("ticket")
//!         .cache_for(Duration::from_secs(60))
//!         .poll_every(Duration::from_secs(30))
//!         .detail(Endpoint::get("/tickets/{id}/"))
//!         .list(Endpoint::get("/tickets/"))
//!         .remote_keys(&[("status", "status")])
//!         .path_rewrites(&["id"]);
//!
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! struct Http;
//!
//! #[async_trait::async_trait]
//! impl Transport for Http {
//!     async fn send(&self, _request: RemoteRequest) -> Result<RemoteResponse, NetworkError> {
//!         // hand the request to an HTTP client here
//!         Err(NetworkError::generic("offline"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = ModelProvider::new(
//!         Arc::new(InMemoryStore::new()),
//!         Arc::new(JsonRemoteClient::new("https://api.example.com", Http)),
//!         ModelSyncConfig::default(),
//!     );
//!
//!     let open = Query::equals("status", "open");
//!     let mut tickets = provider.stream_list::<Ticket>(Some(open), None, vec![]);
//!     while let Some(state) = tickets.next().await {
//!         match state {
//!             ResultState::Loading => println!("loading"),
//!             ResultState::Loaded(tickets) => println!("{} open tickets", tickets.len()),
//!             ResultState::Error(e) => println!("error: {}", e),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::config::ModelSyncConfig;
use crate::error::SyncError;
use crate::fetch::ModelFetcher;
use crate::model::{Model, StoredRecord};
use crate::query::{Query, SortDescriptor};
use crate::remote::{HeadersProvider, RemoteClient};
use crate::storage::ModelStore;
use crate::stream::types::{project_first, project_list, project_single};
use crate::stream::{StreamKey, StreamMultiplexer, Subscription};

/// One-shot gets and deduplicated live streams over a store and a remote client.
///
/// Cheap to clone; clones share the subscription table. The `stream_*`
/// methods start pipelines on the current Tokio runtime; called outside one,
/// they return a subscription that yields [`SyncError::NoRuntime`] and ends.
#[derive(Clone)]
pub struct ModelProvider {
    fetcher: Arc<ModelFetcher>,
    streams: StreamMultiplexer,
}

impl ModelProvider {
    pub fn new(
        store: Arc<dyn ModelStore>,
        remote: Arc<dyn RemoteClient>,
        config: ModelSyncConfig,
    ) -> Self {
        let fetcher = Arc::new(ModelFetcher::new(store, remote, config));
        let streams = StreamMultiplexer::new(fetcher.clone());
        Self { fetcher, streams }
    }

    #[must_use]
    pub fn fetcher(&self) -> &ModelFetcher {
        &self.fetcher
    }

    #[must_use]
    pub fn streams(&self) -> &StreamMultiplexer {
        &self.streams
    }

    /// Replace (or clear) the headers attached to every remote request.
    pub fn set_headers_provider(&self, provider: Option<HeadersProvider>) {
        self.fetcher.remote().set_headers_provider(provider);
    }

    pub async fn get_model<T: Model>(&self, id: &str) -> Result<T, SyncError> {
        self.fetcher.get_model::<T>(id).await
    }

    pub async fn get_singleton<T: Model>(&self) -> Result<T, SyncError> {
        self.fetcher.get_singleton::<T>().await
    }

    pub async fn get_list<T: Model>(
        &self,
        query: Option<&Query>,
        limit: Option<usize>,
        sort: &[SortDescriptor],
    ) -> Result<Vec<T>, SyncError> {
        self.fetcher.get_list::<T>(query, limit, sort).await
    }

    pub async fn get_first<T: Model>(
        &self,
        query: Option<&Query>,
        sort: &[SortDescriptor],
    ) -> Result<T, SyncError> {
        self.fetcher.get_first::<T>(query, sort).await
    }

    /// Live view of one record.
    pub fn stream_model<T: Model>(&self, id: impl Into<String>) -> Subscription<T> {
        self.streams.subscribe(
            StreamKey::model(T::META.model_type, id),
            T::META,
            StoredRecord::decode::<T>,
            project_single::<T>,
        )
    }

    /// Live view of a singleton or default-queryable type.
    pub fn stream_singleton<T: Model>(&self) -> Subscription<T> {
        self.streams.subscribe(
            StreamKey::singleton(T::META.model_type),
            T::META,
            StoredRecord::decode::<T>,
            project_single::<T>,
        )
    }

    /// Live view of a query. `limit` trims what is published, not what is reconciled.
    pub fn stream_list<T: Model>(
        &self,
        query: Option<Query>,
        limit: Option<usize>,
        sort: Vec<SortDescriptor>,
    ) -> Subscription<Vec<T>> {
        self.streams.subscribe(
            StreamKey::list(T::META.model_type, query, limit, sort),
            T::META,
            StoredRecord::decode::<T>,
            project_list::<T>,
        )
    }

    /// Live view of the first record of a query. Shares the unlimited list pipeline.
    pub fn stream_first<T: Model>(
        &self,
        query: Option<Query>,
        sort: Vec<SortDescriptor>,
    ) -> Subscription<T> {
        self.streams.subscribe(
            StreamKey::list(T::META.model_type, query, None, sort),
            T::META,
            StoredRecord::decode::<T>,
            project_first::<T>,
        )
    }
}
