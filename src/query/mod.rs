// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Model
//!
//! Composable filters over one model type, with two independent projections.
//!
//! # Architecture
//!
//! ```text
//! QueryBuilder (AST)
//!     ↓
//!     ├─→ LocalEvaluator   → predicate over cached StoredRecords
//!     └─→ RemoteTranslator → Option<Vec<QueryParam>> for the remote client
//! ```
//!
//! AND is expressible both locally and remotely (by concatenating parameters).
//! OR is local only: its remote projection is always `None`, so OR queries are
//! fetched broad and narrowed by the local predicate.
//!
//! ```rust
//! use model_sync::{ModelMeta, query::{Query, QueryParam}};
//!
//! const META: ModelMeta = ModelMeta::new("widget").remote_keys(&[("value", "v")]);
//!
//! let and = Query::equals("value", 2).and(Query::equals("colour", "red"));
//! assert_eq!(and.remote_params(&META), Some(vec![QueryParam::new("v", "2")]));
//!
//! let or = Query::equals("value", 2).or(Query::equals("value", 3));
//! assert_eq!(or.remote_params(&META), None);
//! ```

mod query_builder;
mod local;
mod remote_translator;
mod sort;

pub use query_builder::{Query, QueryBuilder, QueryNode, FieldQuery, QueryValue};
pub use local::LocalEvaluator;
pub use remote_translator::{RemoteTranslator, QueryParam};
pub use sort::{sort_records, SortDescriptor, SortOrder};
