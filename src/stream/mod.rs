// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Stream Multiplexer
//!
//! Deduplicates live subscriptions: every distinct [`StreamKey`] owns one
//! pipeline task and one [`BroadcastPoint`], shared by all of its observers.
//!
//! # Lifecycle
//!
//! ```text
//! subscribe(key)
//!   ├─ key active?  yes → observers += 1, attach to point
//!   └─               no → new point (Loading), attach, spawn pipeline
//!
//! drop(Subscription)
//!   └─ observers -= 1; at 0 → abort pipeline, forget point
//! ```
//!
//! Points carry type-erased [`StreamPayload`]s. Each [`Subscription`] projects
//! them into its own model type and reports a
//! [`SyncError::TypeMismatch`](crate::SyncError::TypeMismatch) instead of a
//! wrongly typed value.

pub mod broadcast;
pub mod key;
pub mod multiplexer;
pub mod types;

pub use broadcast::BroadcastPoint;
pub use key::{StreamKey, StreamOperation};
pub use multiplexer::{StreamMultiplexer, Subscription};
pub use types::{ResultState, StreamPayload};
