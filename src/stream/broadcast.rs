// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::types::{ResultState, StreamPayload};

/// Shared delivery point for one stream key.
///
/// Remembers the last published value so late observers start from the
/// current state. Publishing and attaching both take the same lock, so an
/// observer sees every value after its initial one exactly once.
pub struct BroadcastPoint {
    latest: Mutex<ResultState<StreamPayload>>,
    sender: broadcast::Sender<ResultState<StreamPayload>>,
}

impl BroadcastPoint {
    /// New point seeded with `Loading`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(ResultState::Loading),
            sender,
        }
    }

    pub fn publish(&self, value: ResultState<StreamPayload>) {
        let mut latest = self.latest.lock();
        *latest = value.clone();
        // No observers yet is fine
        let _ = self.sender.send(value);
    }

    /// Current value plus a receiver for everything published after it.
    pub fn attach(&self) -> (ResultState<StreamPayload>, broadcast::Receiver<ResultState<StreamPayload>>) {
        let latest = self.latest.lock();
        (latest.clone(), self.sender.subscribe())
    }

    #[must_use]
    pub fn latest(&self) -> ResultState<StreamPayload> {
        self.latest.lock().clone()
    }
}
