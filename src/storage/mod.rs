// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Persistent store collaborator.
//!
//! The engine only talks to [`ModelStore`]; [`InMemoryStore`] is the bundled
//! process-local implementation used by tests and by applications that do not
//! need durable caching.

pub mod traits;
pub mod memory;

pub use traits::{ChangeNotification, ModelStore, StorageError};
pub use memory::InMemoryStore;
