//! Error types for the overlay agent.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use overlay_agent::{Result, Error};
//!
//! fn persist(page: &dyn Page, snapshot: &str) -> Result<()> {
//!     page.storage_set(STORAGE_KEY, snapshot)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::HandshakeRejected`] |
//! | Protocol | [`Error::Protocol`] |
//! | Storage | [`Error::Storage`] |
//! | Rendering | [`Error::DetachedNode`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Two fault classes from the overlay's taxonomy are deliberately *not*
//! errors: malformed or unauthorized inbound messages are silently dropped
//! at the transport layer, and identifier lookups that match no live node
//! are no-ops throughout.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::NodeId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. No error in this
/// crate is ever allowed to take down the page being inspected: callers on
/// the event-loop path log and degrade to doing nothing.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when agent configuration is invalid (e.g. an empty origin
    /// allow-list or an unparseable origin entry).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Host link connection failed.
    ///
    /// Returned when the host WebSocket connection cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Host link closed unexpectedly.
    ///
    /// Returned when the link is lost during operation.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Handshake rejected: origin missing or not allow-listed.
    ///
    /// Returned when an incoming host connection fails the origin gate.
    #[error("Handshake rejected for origin: {origin}")]
    HandshakeRejected {
        /// The offending `Origin` header value ("<missing>" when absent).
        origin: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation.
    ///
    /// Returned when an outbound message cannot be framed. Inbound
    /// violations are never errors; they are dropped at the link.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Transient storage read/write failed.
    ///
    /// Returned when the page's storage is disabled or over quota. Callers
    /// treat this as "no saved state" after logging a warning.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    // ========================================================================
    // Rendering Errors
    // ========================================================================
    /// Node detached while positioning overlay content against it.
    ///
    /// The offending tooltip is destroyed rather than left inconsistent.
    #[error("Detached node: {node}")]
    DetachedNode {
        /// The node that no longer has a bounding rect.
        node: NodeId,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a handshake rejection error.
    #[inline]
    pub fn handshake_rejected(origin: impl Into<String>) -> Self {
        Self::HandshakeRejected {
            origin: origin.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a detached node error.
    #[inline]
    pub fn detached_node(node: NodeId) -> Self {
        Self::DetachedNode { node }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::HandshakeRejected { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a storage error.
    ///
    /// Storage errors degrade to fresh navigation initialization.
    #[inline]
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Returns `true` if this is a rendering error.
    ///
    /// Rendering errors destroy the offending tooltip, nothing more.
    #[inline]
    #[must_use]
    pub fn is_rendering_error(&self) -> bool {
        matches!(self, Self::DetachedNode { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
