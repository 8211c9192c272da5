// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote Translator
//!
//! Translates the Query AST into remote query parameters.
//!
//! # Rules
//!
//! ```text
//! field == value   -> [remote_key=value]   if the type maps `field`, else none
//! a AND b          -> params(a) ++ params(b), children without params omitted
//! a OR b           -> none (the remote protocol has no OR)
//! ```
//!
//! Omitting a child from an AND widens the remote result to a superset; the
//! local predicate narrows it back down after the fetch.

use serde::{Deserialize, Serialize};

use super::query_builder::{FieldQuery, Query, QueryNode};
use crate::model::ModelMeta;

/// A single `name=value` remote query parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Remote query translator
pub struct RemoteTranslator;

impl RemoteTranslator {
    /// Translate to remote parameters, or `None` when nothing is expressible remotely.
    pub fn translate(query: &Query, meta: &ModelMeta) -> Option<Vec<QueryParam>> {
        Self::translate_node(&query.root, meta)
    }

    fn translate_node(node: &QueryNode, meta: &ModelMeta) -> Option<Vec<QueryParam>> {
        match node {
            QueryNode::Equals(term) => Self::translate_term(term, meta).map(|p| vec![p]),
            QueryNode::And(nodes) => {
                let params: Vec<QueryParam> = nodes
                    .iter()
                    .filter_map(|n| Self::translate_node(n, meta))
                    .flatten()
                    .collect();
                if params.is_empty() {
                    None
                } else {
                    Some(params)
                }
            }
            QueryNode::Or(_) => None,
        }
    }

    fn translate_term(term: &FieldQuery, meta: &ModelMeta) -> Option<QueryParam> {
        meta.remote_key(&term.field)
            .map(|key| QueryParam::new(key, term.value.to_string()))
    }
}

impl Query {
    /// Remote projection of this query for the given model type
    #[must_use]
    pub fn remote_params(&self, meta: &ModelMeta) -> Option<Vec<QueryParam>> {
        RemoteTranslator::translate(self, meta)
    }
}
