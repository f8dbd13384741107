//! Client-side state slot.
//!
//! Holds the most recent server snapshot. Every completed round trip, from
//! either channel, overwrites it; the last write wins.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::StateSnapshot;

/// Shared handle to the single state slot. Clones point at the same slot.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    slot: Arc<Mutex<Option<StateSnapshot>>>,
}

impl StateStore {
    /// Create an empty store (no snapshot yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an initial snapshot.
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    /// Current snapshot, `None` before the first one is known.
    pub fn get(&self) -> Option<StateSnapshot> {
        self.slot.lock().clone()
    }

    /// Replace the snapshot unconditionally.
    pub fn set(&self, snapshot: StateSnapshot) {
        *self.slot.lock() = Some(snapshot);
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }
}
