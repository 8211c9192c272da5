// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::envelope::{rewrite_path, unwrap_detail, unwrap_list};
use super::request::{RemoteRequest, RemoteResponse, Transport};
use super::{HeadersProvider, NetworkError, RemoteClient};
use crate::model::{Endpoint, ModelMeta};
use crate::query::QueryParam;

/// [`RemoteClient`] speaking JSON over a pluggable [`Transport`].
///
/// Requests go to `base_url + endpoint.path`. Detail fetches by id send an
/// `id` parameter, which a `{id}` path rewrite can move into the path. List
/// fetches send the query's remote parameters.
pub struct JsonRemoteClient<T: Transport> {
    base_url: String,
    transport: T,
    headers: RwLock<Option<HeadersProvider>>,
}

impl<T: Transport> JsonRemoteClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            headers: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn build_request(&self, meta: &ModelMeta, endpoint: Endpoint, params: Vec<QueryParam>) -> RemoteRequest {
        let (path, query) = rewrite_path(endpoint.path, meta.path_rewrites, params);
        // Evaluated per request so rotated credentials are picked up
        let headers = self
            .headers
            .read()
            .as_ref()
            .map(|provider| provider())
            .unwrap_or_default();
        RemoteRequest {
            method: endpoint.method,
            url: format!("{}{}", self.base_url, path),
            query,
            headers,
        }
    }

    async fn send(&self, request: RemoteRequest) -> Result<Value, NetworkError> {
        debug!(method = request.method.as_str(), url = %request.url, params = request.query.len(), "remote request");
        let response = self.transport.send(request).await?;
        check_status(response)
    }
}

fn check_status(response: RemoteResponse) -> Result<Value, NetworkError> {
    match response.status {
        _ if response.is_success() => Ok(response.body),
        404 => Err(NetworkError::NotFound),
        401 | 403 => Err(NetworkError::Unauthorized),
        status => Err(NetworkError::generic(format!("unexpected status {}", status))),
    }
}

#[async_trait]
impl<T: Transport> RemoteClient for JsonRemoteClient<T> {
    async fn fetch_detail(&self, meta: &ModelMeta, id: Option<&str>) -> Result<Value, NetworkError> {
        let endpoint = meta.detail.ok_or(NetworkError::DetailEndpointMissing)?;
        let params = id.map(|id| vec![QueryParam::new("id", id)]).unwrap_or_default();
        let body = self.send(self.build_request(meta, endpoint, params)).await?;
        unwrap_detail(meta, body)
    }

    async fn fetch_list(
        &self,
        meta: &ModelMeta,
        params: Option<&[QueryParam]>,
    ) -> Result<Vec<Value>, NetworkError> {
        let endpoint = meta.list.ok_or(NetworkError::ListEndpointMissing)?;
        let params = params.map(<[QueryParam]>::to_vec).unwrap_or_default();
        let body = self.send(self.build_request(meta, endpoint, params)).await?;
        unwrap_list(meta, body)
    }

    fn set_headers_provider(&self, provider: Option<HeadersProvider>) {
        *self.headers.write() = provider;
    }
}
