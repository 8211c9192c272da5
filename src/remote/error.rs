// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

/// Errors reported by the remote collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("model type has no detail endpoint")]
    DetailEndpointMissing,
    #[error("model type has no list endpoint")]
    ListEndpointMissing,
    #[error("not found")]
    NotFound,
    #[error("list response is missing its nested key")]
    MalformedListResponse,
    #[error("detail response is missing its nested key")]
    MalformedDetailResponse,
    #[error("unauthorized")]
    Unauthorized,
    #[error("network error: {details}")]
    Generic { details: String },
}

impl NetworkError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, NetworkError::Unauthorized)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, NetworkError::NotFound)
    }

    pub fn generic(details: impl Into<String>) -> Self {
        NetworkError::Generic { details: details.into() }
    }
}
