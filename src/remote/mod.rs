// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote client collaborator.
//!
//! The orchestrator calls [`RemoteClient`] with a type's [`ModelMeta`] and
//! receives raw JSON; decoding into the typed model happens on the caller's
//! side. [`JsonRemoteClient`] is a complete client over any [`Transport`].

mod error;
mod envelope;
mod json_client;
mod request;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::ModelMeta;
pub use crate::query::QueryParam;

pub use error::NetworkError;
pub use envelope::{rewrite_path, unwrap_detail, unwrap_list};
pub use json_client::JsonRemoteClient;
pub use request::{RemoteRequest, RemoteResponse, Transport};

/// Produces the headers attached to every outgoing request.
pub type HeadersProvider = Arc<dyn Fn() -> Vec<(String, String)> + Send + Sync>;

#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch one record. `id` is `None` for singleton and default-queryable types.
    async fn fetch_detail(&self, meta: &ModelMeta, id: Option<&str>) -> Result<Value, NetworkError>;

    /// Fetch a list. `None` parameters fetch without server-side filtering.
    async fn fetch_list(
        &self,
        meta: &ModelMeta,
        params: Option<&[QueryParam]>,
    ) -> Result<Vec<Value>, NetworkError>;

    /// Replace (or clear) the per-request headers hook.
    fn set_headers_provider(&self, provider: Option<HeadersProvider>);
}
