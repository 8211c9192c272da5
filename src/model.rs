// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Model definitions.
//!
//! A [`Model`] is an application record mirrored between the local cache and a
//! remote service. Each model type declares its static [`ModelMeta`] (freshness
//! window, polling, endpoints, remotely queryable fields). Inside the engine,
//! models travel as type-erased [`StoredRecord`]s: an id, cache bookkeeping,
//! and the JSON content.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use model_sync::{Endpoint, Model, ModelMeta, StoredRecord};
//! use serde::{Deserialize, Serialize};
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
//!         .detail(Endpoint::get("/tickets/{id}/"))
//!         .list(Endpoint::get("/tickets/"))
//!         .remote_keys(&[("status", "status")]);
//!
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! let ticket = Ticket { id: "t-1".into(), status: "open".into() };
//! let record = StoredRecord::from_model(&ticket).unwrap();
//! assert_eq!(record.id, "t-1");
//! assert!(record.last_cached_at.is_none());
//! ```

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::remote::NetworkError;
use crate::storage::StorageError;

/// Record type tag, assigned in the type's [`ModelMeta`].
///
/// Used directly as a hash-map key component (stream keys, store rows), so two
/// model types must never share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelType(&'static str);

impl ModelType {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// HTTP-style request method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

/// A remote endpoint, relative to the remote client's base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub path: &'static str,
    pub method: RequestMethod,
}

impl Endpoint {
    #[must_use]
    pub const fn new(path: &'static str, method: RequestMethod) -> Self {
        Self { path, method }
    }

    #[must_use]
    pub const fn get(path: &'static str) -> Self {
        Self::new(path, RequestMethod::Get)
    }
}

/// Static, per-type metadata.
///
/// Built with `const` builder methods so it can live in [`Model::META`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMeta {
    pub model_type: ModelType,
    /// Freshness window after `last_cached_at`.
    pub cache_duration: Duration,
    /// Recurring refresh cadence for live streams. `None` fetches once.
    pub poll_interval: Option<Duration>,
    /// Single-item endpoint. `None` means single items are served via the list.
    pub detail: Option<Endpoint>,
    pub list: Option<Endpoint>,
    /// Local field name -> remote query parameter name.
    pub remote_keys: &'static [(&'static str, &'static str)],
    /// Exactly one cached instance, fetched without an id.
    pub singleton: bool,
    /// Fetchable with no query or id at all.
    pub default_queryable: bool,
    /// Key holding the array in a list response. `None` means a bare array.
    pub nested_list_key: Option<&'static str>,
    /// Key holding the object in a detail response. `None` means the body itself.
    pub nested_detail_key: Option<&'static str>,
    /// `{key}` path segments of the detail endpoint filled from query parameters.
    pub path_rewrites: &'static [&'static str],
}

impl ModelMeta {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            model_type: ModelType::new(name),
            cache_duration: Duration::from_secs(0),
            poll_interval: None,
            detail: None,
            list: None,
            remote_keys: &[],
            singleton: false,
            default_queryable: false,
            nested_list_key: Some("results"),
            nested_detail_key: None,
            path_rewrites: &[],
        }
    }

    #[must_use]
    pub const fn cache_for(self, duration: Duration) -> Self {
        Self { cache_duration: duration, ..self }
    }

    #[must_use]
    pub const fn poll_every(self, interval: Duration) -> Self {
        Self { poll_interval: Some(interval), ..self }
    }

    #[must_use]
    pub const fn detail(self, endpoint: Endpoint) -> Self {
        Self { detail: Some(endpoint), ..self }
    }

    #[must_use]
    pub const fn list(self, endpoint: Endpoint) -> Self {
        Self { list: Some(endpoint), ..self }
    }

    #[must_use]
    pub const fn remote_keys(self, keys: &'static [(&'static str, &'static str)]) -> Self {
        Self { remote_keys: keys, ..self }
    }

    /// Marks the type as a singleton. Singletons are also default-queryable.
    #[must_use]
    pub const fn singleton(self) -> Self {
        Self { singleton: true, default_queryable: true, ..self }
    }

    #[must_use]
    pub const fn default_queryable(self) -> Self {
        Self { default_queryable: true, ..self }
    }

    #[must_use]
    pub const fn nested_list_key(self, key: Option<&'static str>) -> Self {
        Self { nested_list_key: key, ..self }
    }

    #[must_use]
    pub const fn nested_detail_key(self, key: Option<&'static str>) -> Self {
        Self { nested_detail_key: key, ..self }
    }

    #[must_use]
    pub const fn path_rewrites(self, keys: &'static [&'static str]) -> Self {
        Self { path_rewrites: keys, ..self }
    }

    /// Remote query parameter name for a local field, if the field is remotely queryable.
    #[must_use]
    pub fn remote_key(&self, field: &str) -> Option<&'static str> {
        self.remote_keys
            .iter()
            .find(|(local, _)| *local == field)
            .map(|(_, remote)| *remote)
    }
}

/// Cache bookkeeping handed back to a model when it is read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheState {
    /// Epoch millis of the write that cached this record.
    pub last_cached_at: Option<i64>,
    /// Index in the most recent list response containing this record.
    pub list_position: Option<usize>,
}

/// An application-defined record type.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const META: ModelMeta;

    fn id(&self) -> &str;

    /// Receives the cache bookkeeping of the stored row this value was read from.
    fn set_cache_state(&mut self, _state: CacheState) {}
}

/// Type-erased cache row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub model_type: ModelType,
    pub id: String,
    /// Set only by the fetch orchestrator when it writes the record.
    pub last_cached_at: Option<i64>,
    pub list_position: Option<usize>,
    pub content: Value,
}

impl StoredRecord {
    /// Wrap a model. Cache bookkeeping starts empty.
    pub fn from_model<T: Model>(model: &T) -> Result<Self, StorageError> {
        let content = serde_json::to_value(model)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            model_type: T::META.model_type,
            id: model.id().to_string(),
            last_cached_at: None,
            list_position: None,
            content,
        })
    }

    /// Decode a remote payload as `T` and wrap it.
    pub fn decode<T: Model>(value: Value) -> Result<Self, NetworkError> {
        let model: T = serde_json::from_value(value).map_err(|e| NetworkError::Generic {
            details: format!("failed to decode {}: {}", T::META.model_type, e),
        })?;
        Self::from_model(&model).map_err(|e| NetworkError::Generic { details: e.to_string() })
    }

    /// Rebuild the typed model, handing it this row's cache bookkeeping.
    pub fn to_model<T: Model>(&self) -> Result<T, serde_json::Error> {
        let mut model: T = serde_json::from_value(self.content.clone())?;
        model.set_cache_state(self.cache_state());
        Ok(model)
    }

    #[must_use]
    pub fn cache_state(&self) -> CacheState {
        CacheState {
            last_cached_at: self.last_cached_at,
            list_position: self.list_position,
        }
    }

    /// Content field by name. `id` is always answered from the row id.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.content.get(name).cloned()
    }

    /// A record that was never cached is never fresh.
    #[must_use]
    pub fn is_fresh(&self, cache_duration: Duration, now_ms: i64) -> bool {
        match self.last_cached_at {
            Some(cached_at) => {
                let age = now_ms.saturating_sub(cached_at);
                age >= 0 && (age as u128) < cache_duration.as_millis()
            }
            None => false,
        }
    }

    /// Stamp with the write time and (for list responses) the response index.
    #[must_use]
    pub fn stamped(mut self, now_ms: i64, list_position: Option<usize>) -> Self {
        self.last_cached_at = Some(now_ms);
        self.list_position = list_position;
        self
    }
}

/// Current time as epoch millis.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
