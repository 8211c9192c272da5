// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use crate::error::SyncError;
use crate::model::{Model, StoredRecord};

/// State of a live stream emission.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState<T> {
    Loading,
    Loaded(T),
    Error(SyncError),
}

impl<T> ResultState<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            ResultState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            ResultState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultState<U> {
        match self {
            ResultState::Loading => ResultState::Loading,
            ResultState::Loaded(value) => ResultState::Loaded(f(value)),
            ResultState::Error(err) => ResultState::Error(err),
        }
    }

    /// Map a loaded value through a fallible conversion, turning failures into `Error`.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, SyncError>) -> ResultState<U> {
        match self {
            ResultState::Loading => ResultState::Loading,
            ResultState::Loaded(value) => f(value).into(),
            ResultState::Error(err) => ResultState::Error(err),
        }
    }
}

impl<T> From<Result<T, SyncError>> for ResultState<T> {
    fn from(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(value) => ResultState::Loaded(value),
            Err(err) => ResultState::Error(err),
        }
    }
}

/// Type-erased value carried by a broadcast point.
///
/// The variant follows the stream operation: single-record keys carry
/// `Single`, list keys carry `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPayload {
    Single(StoredRecord),
    List(Vec<StoredRecord>),
}

impl StreamPayload {
    fn shape(&self) -> &'static str {
        match self {
            StreamPayload::Single(_) => "single record",
            StreamPayload::List(_) => "record list",
        }
    }
}

/// Rebuild a typed model from a stored row, refusing rows of another type.
pub(crate) fn decode_record<T: Model>(record: StoredRecord) -> Result<T, SyncError> {
    let expected = T::META.model_type;
    if record.model_type != expected {
        return Err(SyncError::type_mismatch(expected.name(), record.model_type.name()));
    }
    record
        .to_model::<T>()
        .map_err(|e| SyncError::type_mismatch(expected.name(), format!("undecodable content ({})", e)))
}

/// Projection for single-record streams.
pub(crate) fn project_single<T: Model>(state: ResultState<StreamPayload>) -> ResultState<T> {
    state.and_then(|payload| match payload {
        StreamPayload::Single(record) => decode_record::<T>(record),
        other => Err(SyncError::type_mismatch("single record", other.shape())),
    })
}

/// Projection for list streams.
pub(crate) fn project_list<T: Model>(state: ResultState<StreamPayload>) -> ResultState<Vec<T>> {
    state.and_then(|payload| match payload {
        StreamPayload::List(records) => records.into_iter().map(decode_record::<T>).collect(),
        other => Err(SyncError::type_mismatch("record list", other.shape())),
    })
}

/// Projection for first-of-list streams. An empty list is not-found.
pub(crate) fn project_first<T: Model>(state: ResultState<StreamPayload>) -> ResultState<T> {
    state.and_then(|payload| match payload {
        StreamPayload::List(records) => match records.into_iter().next() {
            Some(record) => decode_record::<T>(record),
            None => Err(crate::remote::NetworkError::NotFound.into()),
        },
        other => Err(SyncError::type_mismatch("record list", other.shape())),
    })
}
