//! Navigation snapshot persistence.
//!
//! Immediately before a self-triggered reload the reconciler writes its
//! state to one transient-storage entry under a fixed key; the restore
//! path after the reload consumes and deletes it. The snapshot is
//! single-use by design, so a stale copy can never resurrect itself after
//! the frame's own later navigations.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Snapshot
// ============================================================================

/// JSON-encoded navigation state handed across a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ordered stack of visited URLs.
    #[serde(rename = "historyStack")]
    pub history_stack: Vec<String>,

    /// Cursor into the stack.
    #[serde(rename = "historyPosition")]
    pub history_position: usize,
}

impl Snapshot {
    /// Creates a snapshot of the given stack and cursor.
    #[inline]
    #[must_use]
    pub fn new(history_stack: Vec<String>, history_position: usize) -> Self {
        Self {
            history_stack,
            history_position,
        }
    }

    /// Encodes to the wire JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on serialization failure.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes and validates a stored snapshot.
    ///
    /// Returns `None` for malformed JSON, an empty stack, or an
    /// out-of-bounds cursor — all treated as "no saved state" by the
    /// restore path.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        let snapshot: Self = serde_json::from_str(raw).ok()?;
        if snapshot.history_stack.is_empty()
            || snapshot.history_position >= snapshot.history_stack.len()
        {
            return None;
        }
        Some(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================
