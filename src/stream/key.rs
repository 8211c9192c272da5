// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::fmt;

use crate::model::ModelType;
use crate::query::{Query, SortDescriptor};

/// What a live stream watches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamOperation {
    Model { id: String },
    Singleton,
    List,
}

/// Identity of a deduplicated live subscription.
///
/// Equal keys share one pipeline. `query`, `limit` and `sort` are only
/// meaningful for [`StreamOperation::List`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub model_type: ModelType,
    pub operation: StreamOperation,
    pub query: Option<Query>,
    pub limit: Option<usize>,
    pub sort: Vec<SortDescriptor>,
}

impl StreamKey {
    pub fn model(model_type: ModelType, id: impl Into<String>) -> Self {
        Self {
            model_type,
            operation: StreamOperation::Model { id: id.into() },
            query: None,
            limit: None,
            sort: Vec::new(),
        }
    }

    pub fn singleton(model_type: ModelType) -> Self {
        Self {
            model_type,
            operation: StreamOperation::Singleton,
            query: None,
            limit: None,
            sort: Vec::new(),
        }
    }

    pub fn list(
        model_type: ModelType,
        query: Option<Query>,
        limit: Option<usize>,
        sort: Vec<SortDescriptor>,
    ) -> Self {
        Self {
            model_type,
            operation: StreamOperation::List,
            query,
            limit,
            sort,
        }
    }

    /// Id whose store changes this key reacts to. `None` means every change of the type.
    #[must_use]
    pub fn watched_id(&self) -> Option<&str> {
        match &self.operation {
            StreamOperation::Model { id } => Some(id),
            StreamOperation::Singleton | StreamOperation::List => None,
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.operation == StreamOperation::List
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            StreamOperation::Model { id } => write!(f, "{}/{}", self.model_type, id),
            StreamOperation::Singleton => write!(f, "{}/singleton", self.model_type),
            StreamOperation::List => {
                write!(f, "{}/list", self.model_type)?;
                if let Some(limit) = self.limit {
                    write!(f, "[..{}]", limit)?;
                }
                Ok(())
            }
        }
    }
}
