//! Type-safe identifiers for page entities.
//!
//! Newtype wrappers prevent mixing incompatible identity channels at
//! compile time. The overlay has two distinct addressing schemes:
//!
//! - [`NodeId`] — an opaque handle the page backend assigns to a live DOM
//!   node. A handle is a lookup key, never an owner: the host page may
//!   remove the node at any time, and every lookup tolerates a miss.
//! - [`EditId`] — the host-assigned id carried in the `data-edit-id`
//!   attribute, used by content/style/delete mutation commands. Deliberately
//!   separate from the source-reference channel in
//!   [`SourceRef`](crate::overlay::SourceRef).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// NodeId
// ============================================================================

/// Opaque handle to a live DOM node, assigned by the page backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node handle from a raw backend value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw backend value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

// ============================================================================
// EditId
// ============================================================================

/// Host-assigned opaque element id for mutation commands.
///
/// Carried in the page as the `data-edit-id` attribute. The host mints
/// these; the agent only ever compares them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditId(String);

impl EditId {
    /// Creates an edit id from a host-provided string.
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EditId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EditId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
