// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

use crate::model::ModelType;
use crate::remote::NetworkError;
use crate::storage::StorageError;

/// Errors surfaced to application code, by one-shot gets and inside
/// [`ResultState::Error`](crate::ResultState::Error) on live streams.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stream produced a payload of the wrong shape or type for its key.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{operation} is not supported for {model_type}")]
    UnsupportedOperation {
        model_type: ModelType,
        operation: &'static str,
    },

    /// A live stream was requested outside a Tokio runtime.
    #[error("live streams need a running Tokio runtime")]
    NoRuntime,
}

impl SyncError {
    /// Remote not-found. The cached copy has already been purged when this is returned.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Network(NetworkError::NotFound))
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Network(e) if e.is_unauthorized())
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        crate::metrics::record_type_mismatch();
        SyncError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
