//! Overlay entities: source identity, highlighting, and the selector
//! state machine.
//!
//! This module contains the in-page inspection machinery:
//!
//! - [`SourceRef`] - source-mapped element identity (`filePath:line:col`)
//! - [`highlight`] - marker attributes and tooltip positioning
//! - [`SelectorEngine`] - activation lifecycle, hover/selection tracking,
//!   and host mutation commands

// ============================================================================
// Submodules
// ============================================================================

/// Source-mapped element identity.
pub mod identity;

/// Marker attributes and tooltip positioning.
pub mod highlight;

/// Selector state machine.
pub mod selector;

// ============================================================================
// Re-exports
// ============================================================================

pub use identity::SourceRef;
pub use selector::SelectorEngine;
