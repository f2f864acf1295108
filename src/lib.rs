//! Overlay Agent - In-page element inspection and navigation control.
//!
//! This library is the remote end of a visual site editor: an overlay
//! agent embedded with an application frame that the host editor drives
//! remotely over an origin-gated link.
//!
//! # Architecture
//!
//! The pairing follows a client-server model:
//!
//! - **Local end (host editor)**: sends commands, receives events
//! - **Remote end (this crate)**: validates and executes commands against
//!   the page, emits events
//!
//! Key design principles:
//!
//! - All DOM access flows through the explicit [`Page`] capability
//!   boundary — no ambient globals
//! - Programmatic history mutation funnels through one notification
//!   event; the navigation reconciler is the single history authority
//! - Every inbound message is untrusted until it passes the origin gate
//!   and parses into a typed command; everything else is silently dropped
//! - No fault is fatal to the inspected page: every error path degrades
//!   to doing nothing
//!
//! # Quick Start
//!
//! ```no_run
//! use overlay_agent::{Agent, AgentOptions, Result};
//!
//! # async fn example(page: impl overlay_agent::Page + 'static) -> Result<()> {
//! let (dom_tx, dom_rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! // The embedding runtime feeds DOM events through dom_tx.
//! let agent = Agent::builder()
//!     .with_options(AgentOptions::new().with_allowed_origin("http://localhost:8081"))
//!     .page(page)
//!     .dom_events(dom_rx)
//!     .build()?;
//!
//! // Runs until the frame unloads; inert when the frame is top-level.
//! agent.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Lifecycle and event loop |
//! | [`config`] | Options and wire/DOM constants |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`navigation`] | History reconciler and snapshot persistence |
//! | [`overlay`] | Identity, highlighting, and the selector |
//! | [`page`] | Page capability boundary |
//! | [`protocol`] | Host message types |
//! | [`transport`] | Origin-gated WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Agent lifecycle and event loop.
pub mod agent;

/// Options and wire/DOM constants.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for page entities.
///
/// Newtype wrappers prevent mixing incompatible identity channels at
/// compile time.
pub mod identifiers;

/// Navigation history reconciler.
pub mod navigation;

/// Overlay entities: identity, highlighting, selection.
pub mod overlay;

/// Page capability boundary.
pub mod page;

/// Host protocol message types.
pub mod protocol;

/// Origin-gated host transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Agent types
pub use agent::{Agent, AgentBuilder};

// Configuration
pub use config::AgentOptions;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{EditId, NodeId};

// Navigation types
pub use navigation::{HistoryReconciler, Snapshot};

// Overlay types
pub use overlay::{SelectorEngine, SourceRef};

// Page types
pub use page::{DomEvent, Page, Rect};

// Protocol types
pub use protocol::{AgentEvent, HostCommand, NavigationAction, SelectionData};

// Transport types
pub use transport::{AllowedOrigins, HostLink, HostListener, Messenger};
