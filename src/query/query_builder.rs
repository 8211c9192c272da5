// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder - AST for model queries
//!
//! Provides a type-safe way to build filters that can be evaluated against
//! cached records and projected into remote query parameters.
//!
//! # Example
//!
//! ```rust
//! use model_sync::query::{Query, QueryBuilder};
//!
//! // Simple field query
//! let query = Query::equals("status", "open");
//!
//! // Builder with AND semantics
//! let query = QueryBuilder::new()
//!     .field_eq("status", "open")
//!     .field_eq("priority", 2)
//!     .build_and();
//!
//! // Boolean combinations
//! let query = Query::equals("status", "open")
//!     .or(Query::equals("status", "pending"));
//! assert!(query.contains_or());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model query AST.
///
/// Equality and hashing are structural: two queries are equal when their
/// terms are equal value-by-value, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Root query node
    pub root: QueryNode,
}

impl Query {
    /// Create a new query from a root node
    pub fn new(root: QueryNode) -> Self {
        Self { root }
    }

    /// Leaf term: `field == value`
    pub fn equals(field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::new(QueryNode::Equals(FieldQuery {
            field: field.into(),
            value: value.into(),
        }))
    }

    /// Match a single record id
    pub fn id(id: impl Into<String>) -> Self {
        Self::equals("id", id.into())
    }

    /// Match any of the given ids
    pub fn id_in<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(QueryNode::Or(
            ids.into_iter()
                .map(|id| QueryNode::Equals(FieldQuery {
                    field: "id".to_string(),
                    value: QueryValue::Text(id.into()),
                }))
                .collect(),
        ))
    }

    /// All of the given queries must match
    pub fn all(items: impl IntoIterator<Item = Query>) -> Self {
        Self::new(QueryNode::And(items.into_iter().map(|q| q.root).collect()))
    }

    /// Any of the given queries may match
    pub fn any(items: impl IntoIterator<Item = Query>) -> Self {
        Self::new(QueryNode::Or(items.into_iter().map(|q| q.root).collect()))
    }

    /// Combine with AND
    pub fn and(self, other: Query) -> Self {
        Self::new(QueryNode::And(vec![self.root, other.root]))
    }

    /// Combine with OR
    pub fn or(self, other: Query) -> Self {
        Self::new(QueryNode::Or(vec![self.root, other.root]))
    }

    /// Whether any OR term appears anywhere in the tree.
    ///
    /// OR has no remote form, so these queries always go to the network
    /// unfiltered (or partially filtered) and are narrowed locally.
    #[must_use]
    pub fn contains_or(&self) -> bool {
        self.root.contains_or()
    }

    /// Leaf terms in order
    #[must_use]
    pub fn terms(&self) -> Vec<&FieldQuery> {
        let mut out = Vec::new();
        self.root.collect_terms(&mut out);
        out
    }
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryNode {
    /// Field equality
    Equals(FieldQuery),
    /// Boolean AND. Empty matches everything.
    And(Vec<QueryNode>),
    /// Boolean OR. Empty matches nothing.
    Or(Vec<QueryNode>),
}

impl QueryNode {
    fn contains_or(&self) -> bool {
        match self {
            QueryNode::Equals(_) => false,
            QueryNode::And(nodes) => nodes.iter().any(QueryNode::contains_or),
            QueryNode::Or(_) => true,
        }
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a FieldQuery>) {
        match self {
            QueryNode::Equals(term) => out.push(term),
            QueryNode::And(nodes) | QueryNode::Or(nodes) => {
                for node in nodes {
                    node.collect_terms(out);
                }
            }
        }
    }
}

/// Field query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldQuery {
    /// Local field name (e.g., "status", "id")
    pub field: String,
    /// Value the field must equal
    pub value: QueryValue,
}

/// Query value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Boolean value
    Boolean(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(text) => f.write_str(text),
            QueryValue::Integer(n) => write!(f, "{}", n),
            QueryValue::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Boolean(value)
    }
}

/// Builder for compound queries
#[derive(Default)]
pub struct QueryBuilder {
    nodes: Vec<QueryNode>,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a field equals constraint
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.nodes.push(QueryNode::Equals(FieldQuery {
            field: field.into(),
            value: value.into(),
        }));
        self
    }

    /// Add an arbitrary sub-query
    pub fn query(mut self, query: Query) -> Self {
        self.nodes.push(query.root);
        self
    }

    /// Build query with AND semantics (all constraints must match)
    pub fn build_and(self) -> Query {
        self.build_with(QueryNode::And)
    }

    /// Build query with OR semantics (any constraint can match)
    pub fn build_or(self) -> Query {
        self.build_with(QueryNode::Or)
    }

    fn build_with(mut self, combine: fn(Vec<QueryNode>) -> QueryNode) -> Query {
        match self.nodes.len() {
            // Empty query matches everything
            0 => Query::new(QueryNode::And(Vec::new())),
            1 => Query::new(self.nodes.remove(0)),
            _ => Query::new(combine(self.nodes)),
        }
    }
}
