// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the model sync engine.
//!
//! # Example
//!
//! ```
//! use model_sync::ModelSyncConfig;
//!
//! // Minimal config (uses defaults)
//! let config = ModelSyncConfig::default();
//! assert_eq!(config.change_debounce_ms, 50);
//!
//! // Tuned config
//! let config = ModelSyncConfig {
//!     change_debounce_ms: 10,
//!     stream_buffer: 16,
//!     ..Default::default()
//! };
//! assert_eq!(config.notification_buffer, 1024);
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the fetch orchestrator, stream multiplexer and
/// the bundled in-memory store.
///
/// All fields have defaults, so an empty document deserializes cleanly.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSyncConfig {
    /// Window (ms) over which store change notifications are coalesced
    /// before a live stream re-reads the cache.
    #[serde(default = "default_change_debounce_ms")]
    pub change_debounce_ms: u64,

    /// Capacity of each stream's broadcast channel. Slow observers that fall
    /// further behind than this skip ahead to newer values.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// Capacity of the in-memory store's change notification channel.
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

fn default_change_debounce_ms() -> u64 { 50 }
fn default_stream_buffer() -> usize { 64 }
fn default_notification_buffer() -> usize { 1024 }

impl ModelSyncConfig {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn change_debounce(&self) -> Duration {
        Duration::from_millis(self.change_debounce_ms)
    }
}

impl Default for ModelSyncConfig {
    fn default() -> Self {
        Self {
            change_debounce_ms: default_change_debounce_ms(),
            stream_buffer: default_stream_buffer(),
            notification_buffer: default_notification_buffer(),
        }
    }
}
