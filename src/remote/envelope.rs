// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Response envelopes and detail-path rewriting.

use serde_json::Value;

use super::NetworkError;
use crate::model::ModelMeta;
use crate::query::QueryParam;

/// Pull the record array out of a list response.
///
/// With a nested key the array must sit under that key; without one the body
/// itself must be the array.
pub fn unwrap_list(meta: &ModelMeta, body: Value) -> Result<Vec<Value>, NetworkError> {
    let array = match meta.nested_list_key {
        Some(key) => match body {
            Value::Object(mut map) => map.remove(key),
            _ => None,
        },
        None => Some(body),
    };
    match array {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(NetworkError::MalformedListResponse),
    }
}

/// Pull the record object out of a detail response.
pub fn unwrap_detail(meta: &ModelMeta, body: Value) -> Result<Value, NetworkError> {
    match meta.nested_detail_key {
        Some(key) => match body {
            Value::Object(mut map) => map.remove(key).ok_or(NetworkError::MalformedDetailResponse),
            _ => Err(NetworkError::MalformedDetailResponse),
        },
        None => Ok(body),
    }
}

/// Fill `{key}` segments of `path` from `params`.
///
/// Every rewrite key found in `params` is substituted, percent-encoded, and
/// removed from the returned parameter list. Keys without a matching parameter
/// are left as-is.
pub fn rewrite_path(
    path: &str,
    rewrites: &[&str],
    params: Vec<QueryParam>,
) -> (String, Vec<QueryParam>) {
    let mut path = path.to_string();
    let mut remaining = Vec::with_capacity(params.len());
    for param in params {
        let placeholder = format!("{{{}}}", param.name);
        if rewrites.contains(&param.name.as_str()) && path.contains(&placeholder) {
            path = path.replace(&placeholder, &urlencoding::encode(&param.value));
        } else {
            remaining.push(param);
        }
    }
    (path, remaining)
}
