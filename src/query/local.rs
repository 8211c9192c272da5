// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local predicate evaluation.
//!
//! Evaluates the Query AST against a cached [`StoredRecord`]. AND over no
//! terms is true, OR over no terms is false. A field missing from the record
//! never matches.

use serde_json::Value;

use super::query_builder::{FieldQuery, Query, QueryNode, QueryValue};
use crate::model::StoredRecord;

/// Evaluates queries against stored records
pub struct LocalEvaluator;

impl LocalEvaluator {
    /// Whether the record satisfies the query
    pub fn matches(query: &Query, record: &StoredRecord) -> bool {
        Self::matches_node(&query.root, record)
    }

    fn matches_node(node: &QueryNode, record: &StoredRecord) -> bool {
        match node {
            QueryNode::Equals(term) => Self::matches_term(term, record),
            QueryNode::And(nodes) => nodes.iter().all(|n| Self::matches_node(n, record)),
            QueryNode::Or(nodes) => nodes.iter().any(|n| Self::matches_node(n, record)),
        }
    }

    fn matches_term(term: &FieldQuery, record: &StoredRecord) -> bool {
        match record.field(&term.field) {
            Some(actual) => value_equals(&term.value, &actual),
            None => false,
        }
    }
}

fn value_equals(expected: &QueryValue, actual: &Value) -> bool {
    match (expected, actual) {
        (QueryValue::Text(text), Value::String(s)) => text == s,
        (QueryValue::Integer(n), Value::Number(num)) => {
            num.as_i64() == Some(*n) || num.as_f64() == Some(*n as f64)
        }
        (QueryValue::Boolean(b), Value::Bool(v)) => b == v,
        _ => false,
    }
}

impl Query {
    /// Local projection of this query
    #[must_use]
    pub fn matches(&self, record: &StoredRecord) -> bool {
        LocalEvaluator::matches(self, record)
    }
}
