//! Per-origin fan-out with fault isolation.
//!
//! The messenger keeps at most one live link per allow-listed origin and
//! broadcasts every outbound event to all of them. Delivery is isolated
//! per origin: a dead link or a failed send is logged and skipped, never
//! preventing delivery to the remaining origins. Broadcasting with no live
//! links is a no-op.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::protocol::{AgentEvent, HostCommand};

use super::{AllowedOrigins, HostLink, HostListener};

// ============================================================================
// Messenger
// ============================================================================

/// Outbound gateway to every connected host origin.
#[derive(Clone)]
pub struct Messenger {
    /// The origin allow-list.
    gate: AllowedOrigins,
    /// Live links keyed by canonical origin.
    links: Arc<Mutex<FxHashMap<String, HostLink>>>,
}

impl Messenger {
    /// Creates a messenger with no live links.
    #[must_use]
    pub fn new(gate: AllowedOrigins) -> Self {
        Self {
            gate,
            links: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// The origin allow-list.
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &AllowedOrigins {
        &self.gate
    }

    /// Number of currently registered links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.lock().len()
    }

    /// Registers a link under its canonical origin, replacing (and
    /// shutting down) any previous link for the same origin.
    pub fn register(&self, link: HostLink) {
        let Some(origin) = AllowedOrigins::canonicalize(link.origin()) else {
            // The handshake gate already validated the origin; anything
            // else is a bug worth surfacing, not a crash.
            warn!(origin = %link.origin(), "Refusing link with non-canonical origin");
            link.shutdown();
            return;
        };

        debug!(origin = %origin, "Registering host link");
        if let Some(previous) = self.links.lock().insert(origin, link) {
            previous.shutdown();
        }
    }

    /// Delivers an event to every allow-listed origin with a live link.
    ///
    /// A failed or dead link is dropped from the registry after logging;
    /// the remaining origins are still attempted.
    pub fn broadcast(&self, event: &AgentEvent) {
        let mut links = self.links.lock();

        for origin in self.gate.entries() {
            let Some(link) = links.get(origin) else {
                continue;
            };

            if let Err(err) = link.send(event) {
                warn!(
                    origin = %origin,
                    event = event.event_name(),
                    error = %err,
                    "Dropping dead host link"
                );
                links.remove(origin);
                continue;
            }

            trace!(origin = %origin, event = event.event_name(), "Event delivered");
        }
    }

    /// Spawns the accept loop: every gated connection becomes a
    /// registered link forwarding commands to `inbound_tx`.
    ///
    /// The task ends when the agent side of `inbound_tx` is dropped and
    /// the next accept completes, or when the listener errors terminally.
    pub fn serve(
        &self,
        listener: HostListener,
        inbound_tx: mpsc::UnboundedSender<HostCommand>,
    ) -> tokio::task::JoinHandle<()> {
        let messenger = self.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, origin)) => {
                        if inbound_tx.is_closed() {
                            debug!("Agent gone, stopping accept loop");
                            break;
                        }
                        let link = HostLink::spawn(stream, origin, inbound_tx.clone());
                        messenger.register(link);
                    }
                    Err(err) if err.is_connection_error() => {
                        // Rejected probes are routine; keep listening.
                        trace!(error = %err, "Connection attempt failed");
                    }
                    Err(err) => {
                        warn!(error = %err, "Accept loop terminated");
                        break;
                    }
                }
            }
        })
    }

    /// Shuts down every live link.
    pub fn shutdown(&self) {
        for (_, link) in self.links.lock().drain() {
            link.shutdown();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
