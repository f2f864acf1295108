//! Outbound agent event definitions.
//!
//! Events are notifications sent from this agent (remote end) to the host
//! editor (local end) when overlay or navigation state changes.
//!
//! # Event Types
//!
//! | `type` | Trigger |
//! |--------|---------|
//! | `ELEMENT_SELECTED` | A validated click selected an element set |
//! | `navigation-state` | Any state-changing navigation operation |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::overlay::SourceRef;
use crate::page::Rect;

// ============================================================================
// AgentEvent
// ============================================================================

/// An event notification from agent to host.
///
/// Delivered to every allow-listed origin with a live link; delivery
/// failures are isolated per origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// An element set was selected inside the active selector.
    #[serde(rename = "ELEMENT_SELECTED")]
    ElementSelected {
        /// Details of the selection.
        data: SelectionData,
    },

    /// The navigation model changed.
    #[serde(rename = "navigation-state")]
    NavigationState {
        /// Whether a back step is possible.
        #[serde(rename = "canGoBack")]
        can_go_back: bool,
        /// Whether a forward step is possible.
        #[serde(rename = "canGoForward")]
        can_go_forward: bool,
        /// The frame's current location.
        #[serde(rename = "currentUrl")]
        current_url: String,
    },
}

impl AgentEvent {
    /// Returns the wire `type` tag for logging.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ElementSelected { .. } => "ELEMENT_SELECTED",
            Self::NavigationState { .. } => "navigation-state",
        }
    }
}

// ============================================================================
// SelectionData
// ============================================================================

/// Data reported with `ELEMENT_SELECTED`.
///
/// Describes the representative (first, in document order) node of the
/// selected set; the identifier addresses the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    /// Source reference shared by every node in the selected set.
    pub identifier: SourceRef,

    /// Lower-cased tag name of the clicked node.
    #[serde(rename = "tagName")]
    pub tag_name: String,

    /// Class attribute of the clicked node.
    #[serde(rename = "className")]
    pub class_name: String,

    /// Element id attribute of the clicked node.
    pub id: String,

    /// Bounding rectangle of the representative node, if it has one.
    pub rect: Option<Rect>,

    /// Rendered text of the representative node.
    #[serde(rename = "innerText")]
    pub inner_text: String,
}

// ============================================================================
// Tests
// ============================================================================
