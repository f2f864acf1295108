//! Marker attributes and tooltip positioning.
//!
//! Visual state is carried entirely by marker attributes — CSS hooks with
//! no other semantics. Hover and selected markers are distinct attributes
//! layered independently; callers enforce that hover styling is never
//! applied to an already-selected node.
//!
//! Tooltips are overlay nodes anchored to their target's bounding
//! rectangle. Positioning against a detached node is a contained failure:
//! the tooltip is destroyed (or hidden, for the shared hover tooltip), and
//! nothing propagates.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::config::{
    ATTR_FULL_WIDTH, ATTR_HOVERED, ATTR_SELECTED, CLASS_SELECTED_TOOLTIP, FULL_WIDTH_EPSILON,
    FULL_WIDTH_INSET, TOOLTIP_OFFSET,
};
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::page::Page;

// ============================================================================
// Markers
// ============================================================================

/// Applies the hover marker, plus the full-width variant when the node
/// spans the viewport.
pub fn mark_hovered(page: &mut dyn Page, node: NodeId) {
    page.set_attribute(node, ATTR_HOVERED, "true");
    if is_full_width(page, node) {
        page.set_attribute(node, ATTR_FULL_WIDTH, "true");
    }
}

/// Applies the selected marker, plus the full-width variant when the node
/// spans the viewport.
pub fn mark_selected(page: &mut dyn Page, node: NodeId) {
    page.set_attribute(node, ATTR_SELECTED, "true");
    if is_full_width(page, node) {
        page.set_attribute(node, ATTR_FULL_WIDTH, "true");
    }
}

/// Strips every visual marker from a node.
pub fn unhighlight(page: &mut dyn Page, node: NodeId) {
    page.remove_attribute(node, ATTR_HOVERED);
    page.remove_attribute(node, ATTR_SELECTED);
    page.remove_attribute(node, ATTR_FULL_WIDTH);
}

/// Returns `true` if the node currently carries the selected marker.
#[must_use]
pub fn is_selected(page: &dyn Page, node: NodeId) -> bool {
    page.get_attribute(node, ATTR_SELECTED).is_some()
}

/// Returns `true` if the node's bounding width is within
/// [`FULL_WIDTH_EPSILON`] of the viewport width.
#[must_use]
pub fn is_full_width(page: &dyn Page, node: NodeId) -> bool {
    page.bounding_rect(node)
        .is_some_and(|rect| rect.spans_viewport(page.viewport_width(), FULL_WIDTH_EPSILON))
}

// ============================================================================
// Tooltip Positioning
// ============================================================================

/// Positions a tooltip against its target and writes the tag-name label.
///
/// Regular elements get the tooltip [`TOOLTIP_OFFSET`] px above them,
/// clamped to non-negative screen coordinates; full-width elements pin it
/// to a fixed top-left inset instead.
///
/// # Errors
///
/// Returns [`Error::DetachedNode`] when the target has no bounding rect.
/// Callers destroy (or hide) the tooltip in response.
pub fn position_tooltip(page: &mut dyn Page, tooltip: NodeId, target: NodeId) -> Result<()> {
    let rect = page
        .bounding_rect(target)
        .ok_or_else(|| Error::detached_node(target))?;
    let tag = page
        .tag_name(target)
        .ok_or_else(|| Error::detached_node(target))?;

    if rect.spans_viewport(page.viewport_width(), FULL_WIDTH_EPSILON) {
        page.set_overlay_position(tooltip, FULL_WIDTH_INSET, FULL_WIDTH_INSET);
    } else {
        let x = rect.x.max(0.0);
        let y = (rect.y - TOOLTIP_OFFSET).max(0.0);
        page.set_overlay_position(tooltip, x, y);
    }

    page.set_overlay_text(tooltip, &tag);
    Ok(())
}

/// Spawns one persistent tooltip for a selected node.
///
/// Returns `None` (after destroying the half-built tooltip) when the
/// target detaches mid-flight.
pub fn spawn_selected_tooltip(page: &mut dyn Page, target: NodeId) -> Option<NodeId> {
    let tooltip = page.create_overlay_node(CLASS_SELECTED_TOOLTIP);

    if let Err(err) = position_tooltip(page, tooltip, target) {
        debug!(%target, error = %err, "Dropping tooltip for unpositionable target");
        page.remove_node(tooltip);
        return None;
    }

    page.set_overlay_visible(tooltip, true);
    Some(tooltip)
}

// ============================================================================
// Tests
// ============================================================================
