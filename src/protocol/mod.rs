//! Host protocol message types.
//!
//! This module defines the message format for communication between the
//! host editor (local end) and this agent (remote end).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`HostCommand`] | Host → Agent | Drive the selector and navigation |
//! | [`AgentEvent`] | Agent → Host | Report selections and navigation state |
//!
//! Both directions are fire-and-forget: commands carry no correlation ids
//! and produce no replies. State flows back solely through events.
//!
//! Inbound text that does not parse into a [`HostCommand`] is silently
//! dropped at the transport layer — untrusted peers routinely probe with
//! unrelated messages, and answering them would only leak information.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Inbound host command definitions |
//! | `event` | Outbound agent event definitions |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound host command definitions.
pub mod command;

/// Outbound agent event definitions.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    ContentPayload, DeletePayload, HostCommand, NavigationAction, StylesPayload, TogglePayload,
};
pub use event::{AgentEvent, SelectionData};
