// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Transport-level request and response types.
//!
//! [`JsonRemoteClient`](super::JsonRemoteClient) builds a [`RemoteRequest`] per
//! call and hands it to a [`Transport`]; the HTTP stack itself lives outside
//! this crate.

use async_trait::async_trait;
use serde_json::Value;

use super::NetworkError;
use crate::model::RequestMethod;
use crate::query::QueryParam;

/// A fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub method: RequestMethod,
    /// Base URL joined with the (rewritten) endpoint path.
    pub url: String,
    pub query: Vec<QueryParam>,
    pub headers: Vec<(String, String)>,
}

impl RemoteRequest {
    /// First query parameter with this name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// First header with this name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Value,
}

impl RemoteResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: Value::Null }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests. Connection failures are reported as [`NetworkError::Generic`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, NetworkError>;
}
