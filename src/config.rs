//! Agent configuration and wire/DOM constants.
//!
//! Provides a type-safe interface for configuring the agent: the origin
//! allow-list, the host link bind address, and timing knobs.
//!
//! # Example
//!
//! ```ignore
//! use overlay_agent::AgentOptions;
//!
//! let options = AgentOptions::new()
//!     .with_allowed_origin("http://localhost:8081")
//!     .with_port(9003);
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// ============================================================================
// DOM Attribute Contract
// ============================================================================

/// Source-reference attribute, formatted `filePath:lineNumber:col`.
///
/// Required on every selectable element; elements without it resolve to the
/// unknown identity.
pub const ATTR_SOURCE: &str = "data-inspect-id";

/// Marker attribute for the hovered visual state. CSS hook only.
pub const ATTR_HOVERED: &str = "data-inspect-hovered";

/// Marker attribute for the selected visual state. CSS hook only.
pub const ATTR_SELECTED: &str = "data-inspect-selected";

/// Boolean attribute flagging elements spanning the full viewport width.
///
/// Affects outline offset and tooltip anchoring only.
pub const ATTR_FULL_WIDTH: &str = "data-full-width";

/// Host-assigned opaque id attribute: the addressing scheme for
/// content/style/delete mutation commands.
pub const ATTR_EDIT_ID: &str = "data-edit-id";

/// Flag attribute: the host permits style edits on this element.
pub const ATTR_STYLE_EDITABLE: &str = "data-style-editable";

/// Flag attribute: the host permits content edits on this element.
pub const ATTR_CONTENT_EDITABLE: &str = "data-content-editable";

/// Swap attribute tracking buttons the agent re-enabled during selection.
///
/// `disabled` is restored from this on deactivation.
pub const ATTR_DISABLED_SWAP: &str = "data-inspect-disabled";

// ============================================================================
// Overlay Constants
// ============================================================================

/// Overlay class for the single shared hover tooltip.
pub const CLASS_HOVER_TOOLTIP: &str = "inspect-hover-tooltip";

/// Overlay class for per-selection persistent tooltips.
pub const CLASS_SELECTED_TOOLTIP: &str = "inspect-selected-tooltip";

/// Stylesheet injected while the selector is active.
///
/// Smooth scrolling fights tooltip anchoring, so it is disabled for the
/// duration of a selection session.
pub const ACTIVE_STYLESHEET: &str = "* { scroll-behavior: auto !important; }";

/// Vertical distance (px) between a tooltip and its anchor element.
pub const TOOLTIP_OFFSET: f64 = 25.0;

/// Width tolerance (px) when deciding whether an element is full-width.
pub const FULL_WIDTH_EPSILON: f64 = 5.0;

/// Fixed top-left inset (px) for tooltips on full-width elements.
pub const FULL_WIDTH_INSET: f64 = 12.0;

// ============================================================================
// Navigation Constants
// ============================================================================

/// Transient-storage key for the navigation snapshot handed across a
/// self-triggered reload.
pub const STORAGE_KEY: &str = "iframeNavigationHistory";

// ============================================================================
// Timing Constants
// ============================================================================

/// Default debounce window for hover highlighting.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(10);

/// Default origin granted host access when none is configured.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8081";

// ============================================================================
// AgentOptions
// ============================================================================

/// Agent configuration options.
///
/// Controls the origin allow-list, where the host link listens, and the
/// hover debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    /// Origins permitted to drive this agent.
    pub allowed_origins: Vec<String>,

    /// IP address the host link listens on.
    pub bind_ip: IpAddr,

    /// Port the host link listens on (0 for ephemeral).
    pub bind_port: u16,

    /// Debounce window applied to hover highlighting.
    pub debounce: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl AgentOptions {
    /// Creates options with the default allow-list and an ephemeral port.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            bind_port: 0,
            debounce: DEBOUNCE_DELAY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl AgentOptions {
    /// Replaces the origin allow-list.
    #[inline]
    #[must_use]
    pub fn with_allowed_origins(
        mut self,
        origins: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one origin to the allow-list.
    #[inline]
    #[must_use]
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Sets the bind IP address.
    #[inline]
    #[must_use]
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the bind port (0 for ephemeral).
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_port = port;
        self
    }

    /// Sets the hover debounce window.
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl AgentOptions {
    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message if the allow-list is empty or contains an
    /// entry that does not parse as an origin.
    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_origins.is_empty() {
            return Err("Origin allow-list must not be empty".to_string());
        }

        for origin in &self.allowed_origins {
            if url::Url::parse(origin).is_err() {
                return Err(format!("Invalid origin in allow-list: {origin}"));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
