//! Selector state machine.
//!
//! Owns the activation lifecycle, hover and selection tracking, and the
//! host mutation commands. The engine is driven by the agent event loop:
//! debounced pointer events, capture-phase clicks, and host commands all
//! land here, strictly in arrival order.
//!
//! Selection uses single-selection-set semantics: selecting a new source
//! reference discards the previous selection entirely, including every
//! node that matched the previous reference.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::{
    ACTIVE_STYLESHEET, ATTR_DISABLED_SWAP, ATTR_EDIT_ID, ATTR_HOVERED, ATTR_SELECTED,
    CLASS_HOVER_TOOLTIP,
};
use crate::identifiers::{EditId, NodeId};
use crate::overlay::highlight;
use crate::overlay::identity::SourceRef;
use crate::page::Page;
use crate::protocol::{AgentEvent, HostCommand, SelectionData};

// ============================================================================
// SelectorState
// ============================================================================

/// Process-wide selector state, created once and living for the life of
/// the page.
///
/// Invariants:
/// - a node is a key in `selected_tooltips` iff it carries the selected
///   marker attribute (external DOM mutation can break this; the
///   double-pass in [`SelectorEngine::clear_all_selections`] repairs it)
/// - `tooltip.is_some() == is_active`
///
/// Node handles here are lookup keys, never owners: the host page may
/// remove any of these nodes at any time.
#[derive(Debug, Default)]
struct SelectorState {
    /// Whether the selector is active.
    is_active: bool,
    /// The most recent hover target.
    hovered: Option<NodeId>,
    /// Selected node → its persistent tooltip.
    selected_tooltips: FxHashMap<NodeId, NodeId>,
    /// The single shared hover tooltip; present iff active.
    tooltip: Option<NodeId>,
    /// The scoped stylesheet injected while active.
    style_element: Option<NodeId>,
    /// Buttons whose `disabled` attribute was swapped out on activation.
    reenabled_buttons: Vec<NodeId>,
    /// Activation happened before the root rendered; fixup is pending.
    pending_button_fixup: bool,
}

// ============================================================================
// SelectorEngine
// ============================================================================

/// The selector state machine.
#[derive(Debug, Default)]
pub struct SelectorEngine {
    state: SelectorState,
}

impl SelectorEngine {
    /// Creates an inactive engine.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while the selector is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Number of tracked selections (for diagnostics and tests).
    #[inline]
    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.state.selected_tooltips.len()
    }
}

// ============================================================================
// Command Dispatch
// ============================================================================

impl SelectorEngine {
    /// Applies a host command to the page.
    ///
    /// Navigation commands are not handled here; the agent routes them to
    /// the reconciler. Resolution misses are no-ops throughout — the live
    /// DOM may have changed since the host issued the command.
    pub fn handle_command(&mut self, page: &mut dyn Page, command: &HostCommand) {
        trace!(command = command.command_name(), "Applying host command");

        match command {
            HostCommand::ToggleSelector { payload } => {
                self.toggle(page, payload.is_active);
            }
            HostCommand::ClearSelections => {
                self.clear_all_selections(page);
            }
            HostCommand::UpdateContent { payload } => {
                if let Some(node) = find_by_edit_id(page, &payload.id) {
                    page.set_text_content(node, &payload.content);
                }
            }
            HostCommand::UpdateStyles { payload } => {
                if let Some(node) = find_by_edit_id(page, &payload.id) {
                    for (property, value) in &payload.styles {
                        page.set_style_property(node, property, value);
                    }
                }
            }
            HostCommand::DeleteElement { payload } => {
                self.delete_element(page, &payload.id);
            }
            HostCommand::Navigation { .. } => {}
        }
    }

    /// Applies `TOGGLE_SELECTOR`: a no-op when the requested state equals
    /// the current state.
    pub fn toggle(&mut self, page: &mut dyn Page, is_active: bool) {
        if self.state.is_active == is_active {
            return;
        }
        if is_active {
            self.activate(page);
        } else {
            self.deactivate(page);
        }
    }

    fn delete_element(&mut self, page: &mut dyn Page, id: &EditId) {
        let Some(node) = find_by_edit_id(page, id) else {
            return;
        };

        // A deleted node must not leave its tooltip behind.
        if let Some(tooltip) = self.state.selected_tooltips.remove(&node) {
            page.remove_node(tooltip);
        }
        page.remove_node(node);
    }
}

// ============================================================================
// Activation Lifecycle
// ============================================================================

impl SelectorEngine {
    fn activate(&mut self, page: &mut dyn Page) {
        debug!("Activating selector");
        self.state.is_active = true;

        let tooltip = page.create_overlay_node(CLASS_HOVER_TOOLTIP);
        page.set_overlay_visible(tooltip, false);
        self.state.tooltip = Some(tooltip);

        self.state.style_element = Some(page.inject_stylesheet(ACTIVE_STYLESHEET));
        page.set_pointer_capture(true);

        // Disabled buttons must stay clickable as selection targets. The
        // fixup waits for the application root when it has not rendered yet.
        if page.root_rendered() {
            self.reenable_disabled_buttons(page);
        } else {
            self.state.pending_button_fixup = true;
        }
    }

    fn deactivate(&mut self, page: &mut dyn Page) {
        debug!("Deactivating selector");

        page.set_pointer_capture(false);
        self.clear_all_selections(page);
        self.restore_disabled_buttons(page);

        if let Some(style) = self.state.style_element.take() {
            page.remove_node(style);
        }

        if let Some(hovered) = self.state.hovered.take()
            && !highlight::is_selected(page, hovered)
        {
            highlight::unhighlight(page, hovered);
        }

        if let Some(tooltip) = self.state.tooltip.take() {
            page.remove_node(tooltip);
        }

        self.state.pending_button_fixup = false;
        self.state.is_active = false;
    }

    /// One-time fixup once the application root renders, when activation
    /// happened first.
    pub fn on_root_rendered(&mut self, page: &mut dyn Page) {
        if self.state.is_active && self.state.pending_button_fixup {
            self.state.pending_button_fixup = false;
            self.reenable_disabled_buttons(page);
        }
    }

    fn reenable_disabled_buttons(&mut self, page: &mut dyn Page) {
        for button in page.query_selector_all("button[disabled]") {
            page.remove_attribute(button, "disabled");
            page.set_attribute(button, ATTR_DISABLED_SWAP, "");
            self.state.reenabled_buttons.push(button);
        }
    }

    fn restore_disabled_buttons(&mut self, page: &mut dyn Page) {
        for button in self.state.reenabled_buttons.drain(..) {
            if page.get_attribute(button, ATTR_DISABLED_SWAP).is_some() {
                page.remove_attribute(button, ATTR_DISABLED_SWAP);
                page.set_attribute(button, "disabled", "");
            }
        }

        // Swap attributes left by anything outside the tracked list.
        for button in page.query_selector_all(&format!("[{ATTR_DISABLED_SWAP}]")) {
            page.remove_attribute(button, ATTR_DISABLED_SWAP);
            page.set_attribute(button, "disabled", "");
        }
    }
}

// ============================================================================
// Hover
// ============================================================================

impl SelectorEngine {
    /// Returns `true` if a node may receive hover highlighting: a live
    /// element that is neither the document root nor an SVG descendant.
    #[must_use]
    pub fn is_valid_hover_target(page: &dyn Page, node: NodeId) -> bool {
        match page.tag_name(node) {
            Some(tag) => tag != "html" && !page.is_svg_descendant(node),
            None => false,
        }
    }

    /// Applies a debounced hover to a target.
    ///
    /// Unhighlights every non-selected node matching the previous hover's
    /// reference, then highlights every node matching the new target's
    /// reference and shows the shared tooltip over the target.
    pub fn hover(&mut self, page: &mut dyn Page, target: NodeId) {
        if !self.state.is_active || !Self::is_valid_hover_target(page, target) {
            return;
        }

        if let Some(previous) = self.state.hovered {
            for node in SourceRef::identify(page, previous).resolve(page) {
                if !highlight::is_selected(page, node) {
                    highlight::unhighlight(page, node);
                }
            }
        }

        self.state.hovered = Some(target);

        for node in SourceRef::identify(page, target).resolve(page) {
            if !highlight::is_selected(page, node) {
                highlight::mark_hovered(page, node);
            }
        }

        if let Some(tooltip) = self.state.tooltip {
            match highlight::position_tooltip(page, tooltip, target) {
                Ok(()) => page.set_overlay_visible(tooltip, true),
                Err(err) => {
                    debug!(%target, error = %err, "Hiding hover tooltip");
                    page.set_overlay_visible(tooltip, false);
                }
            }
        }
    }

    /// Pointer left a node: hides the hover tooltip unless the node is
    /// selected.
    pub fn pointer_out(&mut self, page: &mut dyn Page, target: NodeId) {
        if let Some(tooltip) = self.state.tooltip
            && !highlight::is_selected(page, target)
        {
            page.set_overlay_visible(tooltip, false);
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

impl SelectorEngine {
    /// Applies a validated click: selects the full set of nodes matching
    /// the target's reference and reports the selection.
    ///
    /// Returns `None` (selection cleared, nothing reported) when the
    /// reference resolves to nothing — the DOM may have mutated between
    /// the pointer event and its processing.
    pub fn click(&mut self, page: &mut dyn Page, target: NodeId) -> Option<AgentEvent> {
        if !self.state.is_active || page.tag_name(target).is_none() {
            return None;
        }

        self.clear_all_selections(page);

        let source_ref = SourceRef::identify(page, target);
        let nodes = source_ref.resolve(page);
        let first = *nodes.first()?;

        for node in &nodes {
            highlight::mark_selected(page, *node);
            if let Some(tooltip) = highlight::spawn_selected_tooltip(page, *node) {
                self.state.selected_tooltips.insert(*node, tooltip);
            }
        }

        // The per-selection tooltips supersede the hover tooltip.
        if let Some(tooltip) = self.state.tooltip {
            page.set_overlay_visible(tooltip, false);
        }

        debug!(
            reference = %source_ref.attribute_value(),
            matched = nodes.len(),
            "Selected element set"
        );

        Some(AgentEvent::ElementSelected {
            data: SelectionData {
                identifier: source_ref,
                tag_name: page.tag_name(target).unwrap_or_default(),
                class_name: page.class_name(target).unwrap_or_default(),
                id: page.element_id(target).unwrap_or_default(),
                rect: page.bounding_rect(first),
                inner_text: page.inner_text(first).unwrap_or_default(),
            },
        })
    }

    /// Idempotently removes every selection and hover marker from the
    /// entire document.
    ///
    /// Deliberate double-pass: first clears through the tracked tooltip
    /// map, then re-scans the DOM for marker attributes left behind by
    /// external mutation, guarding against drift between tracked state and
    /// the live DOM.
    pub fn clear_all_selections(&mut self, page: &mut dyn Page) {
        for (node, tooltip) in self.state.selected_tooltips.drain() {
            page.remove_node(tooltip);
            highlight::unhighlight(page, node);
        }

        for node in page.query_selector_all(&format!("[{ATTR_SELECTED}]")) {
            highlight::unhighlight(page, node);
        }
        for node in page.query_selector_all(&format!("[{ATTR_HOVERED}]")) {
            highlight::unhighlight(page, node);
        }
    }
}

// ============================================================================
// Edit-Id Resolution
// ============================================================================

/// Resolves a host-assigned edit id to at most one live node.
///
/// A distinct identity channel from [`SourceRef`]: edit ids address single
/// elements for mutation, source references address sets for selection.
fn find_by_edit_id(page: &dyn Page, id: &EditId) -> Option<NodeId> {
    page.query_selector(&format!(r#"[{ATTR_EDIT_ID}="{}"]"#, id.as_str()))
}

// ============================================================================
// Tests
// ============================================================================
