// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Model Sync
//!
//! A client-side model synchronization engine: keeps a local cache of remote
//! records consistent with the server and fans live updates out to any number
//! of observers without duplicating network work.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ModelProvider                         │
//! │  • get_model / get_singleton / get_list / get_first        │
//! │  • stream_model / stream_singleton / stream_list / ...     │
//! └─────────────────────────────────────────────────────────────┘
//!               │ one-shot                    │ live
//!               ▼                             ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │     Fetch Orchestrator   │◄──│      Stream Multiplexer      │
//! │  • freshness checks      │   │  • one pipeline per key      │
//! │  • not-found purge       │   │  • ref-counted observers     │
//! │  • list reconciliation   │   │  • polling + store changes   │
//! └──────────────────────────┘   └──────────────────────────────┘
//!        │               │
//!        ▼               ▼
//! ┌──────────────┐ ┌──────────────┐
//! │  ModelStore  │ │ RemoteClient │
//! └──────────────┘ └──────────────┘
//! ```
//!
//! ## Features
//!
//! - **Freshness windows**: fresh cached records are served without a round trip
//! - **Reconciliation**: list refreshes delete cached records missing upstream
//! - **Local/remote queries**: AND goes to the server, OR is filtered locally
//! - **Deduplication**: equal stream requests share one pipeline and one poll timer
//! - **Cross-pipeline updates**: streams re-read the cache when other pipelines write it
//!
//! ## Configuration
//!
//! See [`ModelSyncConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`model`]: the [`Model`] trait and per-type [`ModelMeta`]
//! - [`query`]: query AST with local and remote projections
//! - [`storage`]: persistent store trait and the in-memory store
//! - [`remote`]: remote client trait and the JSON client
//! - [`fetch`]: the fetch orchestrator
//! - [`stream`]: the stream multiplexer

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod storage;
pub mod remote;
pub mod fetch;
pub mod stream;
pub mod provider;
pub mod metrics;

pub use config::ModelSyncConfig;
pub use error::SyncError;
pub use model::{CacheState, Endpoint, Model, ModelMeta, ModelType, RequestMethod, StoredRecord};
pub use query::{Query, QueryBuilder, QueryValue, SortDescriptor, SortOrder};
pub use storage::{ChangeNotification, InMemoryStore, ModelStore, StorageError};
pub use remote::{
    HeadersProvider, JsonRemoteClient, NetworkError, QueryParam, RemoteClient, RemoteRequest,
    RemoteResponse, Transport,
};
pub use fetch::ModelFetcher;
pub use stream::{ResultState, StreamKey, StreamMultiplexer, StreamOperation, Subscription};
pub use provider::ModelProvider;
pub use metrics::LatencyTimer;
