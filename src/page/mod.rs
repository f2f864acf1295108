//! Page capability boundary.
//!
//! The agent never touches the document directly: every DOM query,
//! mutation, navigation step, and transient-storage access flows through
//! the [`Page`] trait. The embedding runtime supplies the real
//! implementation; tests supply an in-memory fake.
//!
//! Raw DOM activity flows the other way as [`DomEvent`] values on a
//! channel the embedding runtime feeds. Programmatic history mutation
//! (pushState/replaceState-style) is required to funnel through
//! [`DomEvent::LocationChanged`] — there is no monkey-patching; the
//! reconciler is the single navigation authority.

// ============================================================================
// Submodules
// ============================================================================

#[cfg(test)]
pub(crate) mod fake;

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::NodeId;

// ============================================================================
// Rect
// ============================================================================

/// An element's bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if this rect spans the viewport width within the
    /// given tolerance.
    #[inline]
    #[must_use]
    pub fn spans_viewport(&self, viewport_width: f64, epsilon: f64) -> bool {
        (self.width - viewport_width).abs() < epsilon
    }
}

// ============================================================================
// DomEvent
// ============================================================================

/// A raw DOM notification from the embedding runtime.
///
/// Pointer events are coalesced by the agent's debounce; everything else is
/// processed in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    /// The document finished initial parsing.
    ///
    /// Only meaningful before the agent's one-time readiness gate; later
    /// occurrences are ignored.
    Ready,
    /// Pointer entered a node.
    PointerOver(NodeId),
    /// Pointer left a node.
    PointerOut(NodeId),
    /// A click landed on a node (capture phase while the selector is
    /// active; the selector owns all clicks during selection mode).
    Click(NodeId),
    /// Native back/forward navigation completed.
    PopState,
    /// The location changed through programmatic history mutation.
    ///
    /// The explicit interception funnel: the embedding runtime emits this
    /// after performing the native push/replace behavior.
    LocationChanged,
    /// The application's root content finished rendering.
    RootRendered,
    /// The frame is unloading.
    Unload,
}

// ============================================================================
// Page Trait
// ============================================================================

/// Synchronous capability surface over the embedded document.
///
/// Implementations must tolerate stale [`NodeId`]s everywhere: the host
/// page's own scripts mutate the same DOM concurrently, so any handle may
/// refer to a removed node. Lookups on stale handles return `None`/empty,
/// mutations on them are silent no-ops.
pub trait Page: Send {
    // ========================================================================
    // Embedding & readiness
    // ========================================================================

    /// Returns `true` if this frame has a distinct parent window.
    ///
    /// The entire agent is a no-op when running top-level.
    fn is_embedded(&self) -> bool;

    /// Returns `true` once the document has finished initial parsing.
    fn is_ready(&self) -> bool;

    /// Returns `true` once the application root has rendered content.
    fn root_rendered(&self) -> bool;

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns all nodes matching a CSS attribute selector, in document
    /// order.
    fn query_selector_all(&self, selector: &str) -> Vec<NodeId>;

    /// Returns the first node matching a CSS attribute selector.
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Returns `true` if the node is still attached to the document.
    fn contains(&self, node: NodeId) -> bool;

    // ========================================================================
    // Node inspection
    // ========================================================================

    /// Lower-cased tag name, or `None` for a stale handle.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// The `class` attribute value (empty string when unset).
    fn class_name(&self, node: NodeId) -> Option<String>;

    /// The `id` attribute value (empty string when unset).
    fn element_id(&self, node: NodeId) -> Option<String>;

    /// Rendered text content.
    fn inner_text(&self, node: NodeId) -> Option<String>;

    /// An attribute value, `None` when absent or the handle is stale.
    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Bounding rectangle, `None` for detached or stale nodes.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Returns `true` if the node lives inside an `svg` subtree without
    /// being the `svg` root itself.
    fn is_svg_descendant(&self, node: NodeId) -> bool;

    // ========================================================================
    // Node mutation
    // ========================================================================

    /// Sets an attribute. No-op on a stale handle.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Removes an attribute. No-op when absent or stale.
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Replaces the node's text content.
    fn set_text_content(&mut self, node: NodeId, text: &str);

    /// Sets one inline style property.
    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str);

    /// Detaches the node from the document.
    fn remove_node(&mut self, node: NodeId);

    // ========================================================================
    // Overlay surface
    // ========================================================================

    /// Creates a floating overlay node (tooltip) with the given class.
    fn create_overlay_node(&mut self, class_name: &str) -> NodeId;

    /// Sets an overlay node's text.
    fn set_overlay_text(&mut self, node: NodeId, text: &str);

    /// Positions an overlay node at fixed viewport coordinates.
    fn set_overlay_position(&mut self, node: NodeId, x: f64, y: f64);

    /// Shows or hides an overlay node.
    fn set_overlay_visible(&mut self, node: NodeId, visible: bool);

    /// Injects a stylesheet into the document head, returning its handle
    /// so it can be removed with [`Page::remove_node`].
    fn inject_stylesheet(&mut self, css: &str) -> NodeId;

    // ========================================================================
    // Pointer capture
    // ========================================================================

    /// Installs or removes the document-level pointer and click listeners.
    ///
    /// While enabled, the embedding runtime must deliver clicks from the
    /// capture phase — observed before the host page's own handlers — and
    /// suppress their default action and propagation: the selector owns
    /// all clicks during selection mode.
    fn set_pointer_capture(&mut self, enabled: bool);

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Current viewport width in pixels.
    fn viewport_width(&self) -> f64;

    // ========================================================================
    // Navigation
    // ========================================================================

    /// The frame's current location.
    fn current_url(&self) -> String;

    /// Triggers one native back step.
    fn go_back(&mut self);

    /// Triggers one native forward step.
    fn go_forward(&mut self);

    /// Triggers a full reload of the frame.
    fn reload(&mut self);

    // ========================================================================
    // Transient storage
    // ========================================================================

    /// Reads a transient-storage entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) when storage is
    /// disabled or unreadable.
    fn storage_get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a transient-storage entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) on quota or
    /// disabled storage.
    fn storage_set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes a transient-storage entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) when storage is
    /// disabled.
    fn storage_remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_spans_viewport() {
        let rect = Rect::new(0.0, 0.0, 1278.0, 50.0);
        assert!(rect.spans_viewport(1280.0, 5.0));
        assert!(!rect.spans_viewport(1280.0, 1.0));
    }

    #[test]
    fn test_rect_serde_fields() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&rect).expect("serialize");
        assert_eq!(json, r#"{"x":1.0,"y":2.0,"width":3.0,"height":4.0}"#);
    }

    #[test]
    fn test_dom_event_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<DomEvent>();
    }
}
