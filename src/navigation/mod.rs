//! Navigation history reconciler.
//!
//! Maintains an ordered stack of visited URLs and a cursor, and keeps both
//! consistent with the browser's actual navigation — including navigations
//! this agent did not originate. Programmatic history mutation reaches the
//! reconciler through [`DomEvent::LocationChanged`](crate::page::DomEvent)
//! (the explicit interception funnel); native back/forward lands as
//! pop-state events; self-triggered reloads hand state across via a
//! single-use storage snapshot.
//!
//! After every state-changing operation the reconciler reports
//! `navigation-state` to the host — skipped entirely when the frame runs
//! top-level.

// ============================================================================
// Submodules
// ============================================================================

/// Navigation snapshot persistence.
pub mod snapshot;

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::config::STORAGE_KEY;
use crate::page::Page;
use crate::protocol::{AgentEvent, NavigationAction};

pub use snapshot::Snapshot;

// ============================================================================
// HistoryReconciler
// ============================================================================

/// The navigation history model.
///
/// Invariants (when consistent):
/// - `0 <= position < stack.len()`
/// - `stack[position]` equals the current document location
///
/// The second invariant is transiently violated while a native navigation
/// is in flight: [`HistoryReconciler::back`] and
/// [`HistoryReconciler::forward`] move the cursor optimistically before the
/// native call resolves, and the subsequent pop-state re-establishes
/// consistency.
#[derive(Debug, Default)]
pub struct HistoryReconciler {
    stack: Vec<String>,
    position: usize,
    initialized: bool,
}

impl HistoryReconciler {
    /// Creates an uninitialized reconciler.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered stack of visited URLs.
    #[inline]
    #[must_use]
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// The cursor into the stack.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether a back step is possible.
    #[inline]
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.position > 0
    }

    /// Whether a forward step is possible.
    #[inline]
    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.position + 1 < self.stack.len()
    }
}

// ============================================================================
// Initialization & Restore
// ============================================================================

impl HistoryReconciler {
    /// Initializes the model: restores the persisted snapshot when one
    /// exists, otherwise starts a fresh single-entry stack at the current
    /// location. Runs once per frame instance.
    ///
    /// Returns the initial `navigation-state` report.
    pub fn initialize(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        if self.initialized {
            return None;
        }
        self.initialized = true;

        if !self.restore(page) {
            self.stack = vec![page.current_url()];
            self.position = 0;
        }

        debug!(
            entries = self.stack.len(),
            position = self.position,
            "Navigation model initialized"
        );
        self.report(page)
    }

    /// Attempts to restore from the persisted snapshot.
    ///
    /// When the current location already appears in the restored stack the
    /// cursor snaps to that entry (a back/forward step landed on a
    /// reload); otherwise the current location is appended and the cursor
    /// moves to it. The snapshot is consumed either way it decodes:
    /// deleted immediately so it can never resurrect after this frame's
    /// own later navigations.
    fn restore(&mut self, page: &mut dyn Page) -> bool {
        let raw = match page.storage_get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                warn!(error = %err, "Failed to read navigation snapshot");
                return false;
            }
        };

        if let Err(err) = page.storage_remove(STORAGE_KEY) {
            warn!(error = %err, "Failed to delete navigation snapshot");
        }

        let Some(snapshot) = Snapshot::decode(&raw) else {
            warn!("Discarding malformed navigation snapshot");
            return false;
        };

        let current = page.current_url();
        match snapshot.history_stack.iter().position(|u| *u == current) {
            Some(index) => {
                self.stack = snapshot.history_stack;
                self.position = index;
            }
            None => {
                self.stack = snapshot.history_stack;
                self.stack.push(current);
                self.position = self.stack.len() - 1;
            }
        }

        debug!(
            entries = self.stack.len(),
            position = self.position,
            "Navigation state restored from snapshot"
        );
        true
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

impl HistoryReconciler {
    /// Records a location change from any source.
    ///
    /// Idempotent: a redundant notification for the location already at
    /// the cursor is a no-op. Otherwise forward history after the cursor
    /// is discarded (standard browser semantics) and the new location is
    /// appended with the cursor at the end.
    pub fn record_navigation(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        let current = page.current_url();

        if self.stack.get(self.position).is_some_and(|u| *u == current) {
            return None;
        }

        self.stack.truncate(self.position + 1);
        self.stack.push(current);
        self.position = self.stack.len() - 1;

        self.report(page)
    }

    /// Reconciles after a native back/forward navigation.
    ///
    /// The resulting location is assumed to be one this model already
    /// knows: the cursor snaps to its index without mutating the stack.
    /// A location the model failed to track (e.g. hash-only navigation
    /// from outside this reconciler's awareness) falls back to
    /// [`HistoryReconciler::record_navigation`].
    pub fn handle_pop_state(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        let current = page.current_url();

        match self.stack.iter().position(|u| *u == current) {
            Some(index) => {
                self.position = index;
                self.report(page)
            }
            None => self.record_navigation(page),
        }
    }
}

// ============================================================================
// Host Navigation Commands
// ============================================================================

impl HistoryReconciler {
    /// Dispatches a `navigation-command` action by name.
    ///
    /// Unknown action names are ignored.
    pub fn handle_action(
        &mut self,
        page: &mut dyn Page,
        action: NavigationAction,
    ) -> Option<AgentEvent> {
        match action {
            NavigationAction::Back => self.back(page),
            NavigationAction::Forward => self.forward(page),
            NavigationAction::Refresh => self.refresh(page),
            NavigationAction::Unknown => None,
        }
    }

    /// Steps back one entry: no-op at the first entry; otherwise the
    /// cursor moves optimistically and one native back step is triggered.
    pub fn back(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        if !self.can_go_back() {
            return None;
        }
        self.position -= 1;
        page.go_back();
        self.report(page)
    }

    /// Steps forward one entry: no-op at the last entry; otherwise the
    /// cursor moves optimistically and one native forward step is
    /// triggered.
    pub fn forward(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        if !self.can_go_forward() {
            return None;
        }
        self.position += 1;
        page.go_forward();
        self.report(page)
    }

    /// Persists the snapshot, then triggers a full reload.
    ///
    /// A persistence failure is logged and the reload proceeds — the model
    /// then re-initializes fresh after the reload, which beats blocking
    /// the user's refresh on a storage quota.
    pub fn refresh(&mut self, page: &mut dyn Page) -> Option<AgentEvent> {
        let snapshot = Snapshot::new(self.stack.clone(), self.position);
        match snapshot.encode() {
            Ok(encoded) => {
                if let Err(err) = page.storage_set(STORAGE_KEY, &encoded) {
                    warn!(error = %err, "Failed to persist navigation snapshot");
                }
            }
            Err(err) => warn!(error = %err, "Failed to encode navigation snapshot"),
        }

        page.reload();
        None
    }
}

// ============================================================================
// Reporting
// ============================================================================

impl HistoryReconciler {
    /// Builds the `navigation-state` report, or `None` when the frame is
    /// not embedded.
    pub fn report(&self, page: &dyn Page) -> Option<AgentEvent> {
        if !page.is_embedded() {
            return None;
        }

        Some(AgentEvent::NavigationState {
            can_go_back: self.can_go_back(),
            can_go_forward: self.can_go_forward(),
            current_url: page.current_url(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
