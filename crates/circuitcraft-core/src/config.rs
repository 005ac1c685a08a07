//! # Board Configuration
//!
//! Per-board settings that the lifecycle checks and perch updates consult.

use crate::primitives::{DOWN_SLOT, UP_SLOT};
use serde::{Deserialize, Serialize};

/// Settings carried by every [`crate::CircuitBoard`] and persisted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Slot holding a perch's backward value.
    pub backward_slot: String,
    /// Slot holding a perch's forward value.
    pub forward_slot: String,
    /// When true, bulk updates silently skip slots a perch does not declare.
    pub permissive_updates: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            backward_slot: UP_SLOT.to_string(),
            forward_slot: DOWN_SLOT.to_string(),
            permissive_updates: false,
        }
    }
}

impl BoardConfig {
    /// Use custom boundary slot names, e.g. `comp`/`sim`.
    #[must_use]
    pub fn with_slots(backward: impl Into<String>, forward: impl Into<String>) -> Self {
        Self {
            backward_slot: backward.into(),
            forward_slot: forward.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn permissive(mut self) -> Self {
        self.permissive_updates = true;
        self
    }
}
