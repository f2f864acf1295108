//! Inbound host command definitions.
//!
//! Commands arrive as JSON text frames tagged by a `type` field, with
//! command-specific data under `payload` (the navigation command carries
//! its `action` at the top level, matching the host editor's wire format).
//!
//! # Command Types
//!
//! | `type` | Effect |
//! |--------|--------|
//! | `TOGGLE_SELECTOR` | Activate or deactivate the element selector |
//! | `CLEAR_SELECTIONS` | Remove every selection marker and tooltip |
//! | `UPDATE_CONTENT` | Replace an element's text content |
//! | `UPDATE_STYLES` | Apply inline style properties to an element |
//! | `DELETE_ELEMENT` | Remove an element from the document |
//! | `navigation-command` | Dispatch back/forward/refresh |

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::EditId;

// ============================================================================
// HostCommand
// ============================================================================

/// A command from the host editor.
///
/// Unrecognized `type` values fail deserialization and are dropped by the
/// caller; a recognized command with a malformed payload is likewise
/// dropped. Neither case produces a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    /// Activate or deactivate the element selector.
    #[serde(rename = "TOGGLE_SELECTOR")]
    ToggleSelector {
        /// Requested activation state.
        payload: TogglePayload,
    },

    /// Remove every selection marker and tooltip from the document.
    #[serde(rename = "CLEAR_SELECTIONS")]
    ClearSelections,

    /// Replace the text content of the element addressed by an edit id.
    #[serde(rename = "UPDATE_CONTENT")]
    UpdateContent {
        /// Target element and new content.
        payload: ContentPayload,
    },

    /// Apply inline style properties to the element addressed by an edit id.
    #[serde(rename = "UPDATE_STYLES")]
    UpdateStyles {
        /// Target element and style mapping.
        payload: StylesPayload,
    },

    /// Remove the element addressed by an edit id from the document.
    #[serde(rename = "DELETE_ELEMENT")]
    DeleteElement {
        /// Target element.
        payload: DeletePayload,
    },

    /// Dispatch a navigation action by name.
    #[serde(rename = "navigation-command")]
    Navigation {
        /// The action to dispatch. Unknown names are ignored at dispatch.
        action: NavigationAction,
    },
}

impl HostCommand {
    /// Parses a raw inbound text frame, returning `None` for anything that
    /// is not a recognized command.
    ///
    /// This is the single entry point for untrusted input: malformed JSON,
    /// an unknown `type`, or a payload of the wrong shape all yield `None`.
    #[inline]
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Returns the wire `type` tag for logging.
    #[must_use]
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::ToggleSelector { .. } => "TOGGLE_SELECTOR",
            Self::ClearSelections => "CLEAR_SELECTIONS",
            Self::UpdateContent { .. } => "UPDATE_CONTENT",
            Self::UpdateStyles { .. } => "UPDATE_STYLES",
            Self::DeleteElement { .. } => "DELETE_ELEMENT",
            Self::Navigation { .. } => "navigation-command",
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Payload of [`HostCommand::ToggleSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglePayload {
    /// Requested activation state.
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

/// Payload of [`HostCommand::UpdateContent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    /// Host-assigned id of the target element.
    pub id: EditId,
    /// New text content.
    pub content: String,
}

/// Payload of [`HostCommand::UpdateStyles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylesPayload {
    /// Host-assigned id of the target element.
    pub id: EditId,
    /// Style properties to set, `property → value`.
    pub styles: BTreeMap<String, String>,
}

/// Payload of [`HostCommand::DeleteElement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    /// Host-assigned id of the target element.
    pub id: EditId,
}

// ============================================================================
// NavigationAction
// ============================================================================

/// Navigation action names carried by `navigation-command`.
///
/// An unrecognized name deserializes to [`NavigationAction::Unknown`] so a
/// single bad action cannot poison an otherwise valid command stream; the
/// dispatcher ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NavigationAction {
    /// Step back one entry in history.
    Back,
    /// Step forward one entry in history.
    Forward,
    /// Persist navigation state and reload the frame.
    Refresh,
    /// Any action name this agent does not understand.
    Unknown,
}

impl From<String> for NavigationAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "back" => Self::Back,
            "forward" => Self::Forward,
            "refresh" => Self::Refresh,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
