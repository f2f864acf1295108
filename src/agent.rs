//! Agent lifecycle and event loop.
//!
//! The [`Agent`] wires the selector engine, the navigation reconciler, and
//! the origin-gated messenger around a [`Page`] backend, then runs a
//! single-threaded cooperative event loop: host commands in strict arrival
//! order, raw DOM events, and the hover debounce deadline. Only pointer
//! events are ever coalesced.
//!
//! The entire agent is a no-op unless the frame is embedded (has a
//! distinct parent window).

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::AgentOptions;
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::navigation::HistoryReconciler;
use crate::overlay::SelectorEngine;
use crate::page::{DomEvent, Page};
use crate::protocol::{AgentEvent, HostCommand};
use crate::transport::{AllowedOrigins, HostListener, Messenger};

// ============================================================================
// HoverSlot
// ============================================================================

/// Single-slot pending-hover timer with cancel-and-restart semantics.
///
/// At most one invocation is pending at a time, always carrying the most
/// recent target: arming overwrites both the deadline and the target, so a
/// burst of pointer movement collapses into one highlight of the last
/// element. Cancelling (on deactivation) guarantees no debounced hover
/// fires afterwards.
#[derive(Debug, Default)]
struct HoverSlot {
    pending: Option<(Instant, NodeId)>,
}

impl HoverSlot {
    /// Arms (or re-arms) the slot for a target.
    fn arm(&mut self, target: NodeId, delay: Duration) {
        self.pending = Some((Instant::now() + delay, target));
    }

    /// Clears the slot.
    fn cancel(&mut self) {
        self.pending = None;
    }

    /// The pending deadline, if armed.
    fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// Takes the pending target, disarming the slot.
    fn take(&mut self) -> Option<NodeId> {
        self.pending.take().map(|(_, target)| target)
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Event-loop flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep processing.
    Continue,
    /// The frame is unloading; tear down and exit.
    Exit,
}

/// One resolved step of the event loop.
enum Step {
    /// A host command arrived (or the channel closed).
    Command(Option<HostCommand>),
    /// A raw DOM event arrived (or the channel closed).
    Dom(Option<DomEvent>),
    /// The hover debounce deadline fired.
    HoverFire,
}

// ============================================================================
// AgentBuilder
// ============================================================================

/// Builder for [`Agent`].
///
/// # Example
///
/// ```ignore
/// let (dom_tx, dom_rx) = tokio::sync::mpsc::unbounded_channel();
/// let agent = Agent::builder()
///     .with_options(AgentOptions::new().with_port(9003))
///     .page(my_page)
///     .dom_events(dom_rx)
///     .build()?;
/// agent.run().await?;
/// ```
#[derive(Default)]
pub struct AgentBuilder {
    options: AgentOptions,
    page: Option<Box<dyn Page>>,
    dom_events: Option<mpsc::UnboundedReceiver<DomEvent>>,
}

impl AgentBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: AgentOptions::new(),
            page: None,
            dom_events: None,
        }
    }

    /// Replaces the agent options.
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the page backend.
    #[inline]
    #[must_use]
    pub fn page(mut self, page: impl Page + 'static) -> Self {
        self.page = Some(Box::new(page));
        self
    }

    /// Sets the DOM event channel fed by the embedding runtime.
    #[inline]
    #[must_use]
    pub fn dom_events(mut self, events: mpsc::UnboundedReceiver<DomEvent>) -> Self {
        self.dom_events = Some(events);
        self
    }

    /// Builds the agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the page backend or DOM event
    /// channel is missing, or when the options fail validation.
    pub fn build(self) -> Result<Agent> {
        self.options.validate().map_err(Error::config)?;

        let page = self
            .page
            .ok_or_else(|| Error::config("page backend is required"))?;
        let dom_events = self
            .dom_events
            .ok_or_else(|| Error::config("DOM event channel is required"))?;

        Ok(Agent {
            options: self.options,
            page,
            dom_events,
            selector: SelectorEngine::new(),
            reconciler: HistoryReconciler::new(),
        })
    }
}

// ============================================================================
// Agent
// ============================================================================

/// The in-page overlay agent.
///
/// Owns the process-wide selector and navigation state; nothing else may
/// mutate them. Created via [`Agent::builder`], consumed by
/// [`Agent::run`].
pub struct Agent {
    options: AgentOptions,
    page: Box<dyn Page>,
    dom_events: mpsc::UnboundedReceiver<DomEvent>,
    selector: SelectorEngine,
    reconciler: HistoryReconciler,
}

impl core::fmt::Debug for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Returns a new builder.
    #[inline]
    #[must_use]
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Runs the agent until the frame unloads.
    ///
    /// Returns immediately (a complete no-op, no listener bound) when the
    /// frame is not embedded.
    ///
    /// # Errors
    ///
    /// Returns an error only for startup failures (invalid origins, bind
    /// failure). Once the loop is running, every fault path degrades to
    /// doing nothing — this overlay must never break the page it
    /// inspects.
    pub async fn run(mut self) -> Result<()> {
        if !self.page.is_embedded() {
            debug!("Frame is top-level, agent inert");
            return Ok(());
        }

        let gate = AllowedOrigins::parse(&self.options.allowed_origins)?;
        let listener =
            HostListener::bind(self.options.bind_ip, self.options.bind_port, gate.clone()).await?;
        info!(url = %listener.ws_url(), "Agent listening for host");

        let messenger = Messenger::new(gate);
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let accept_task = messenger.serve(listener, inbound_tx);

        // One-time readiness gate: an immediate check, or the runtime's
        // ready notification.
        if !self.page.is_ready() {
            loop {
                match self.dom_events.recv().await {
                    Some(DomEvent::Ready) => break,
                    Some(DomEvent::Unload) | None => {
                        messenger.shutdown();
                        accept_task.abort();
                        return Ok(());
                    }
                    // Raw events before readiness carry stale targets.
                    Some(_) => {}
                }
            }
        }

        if let Some(event) = self.reconciler.initialize(&mut *self.page) {
            messenger.broadcast(&event);
        }

        let mut hover = HoverSlot::default();

        loop {
            let deadline = hover.deadline();

            // Resolve the next step first so the handlers below are free
            // to borrow the agent mutably.
            let step = tokio::select! {
                command = inbound_rx.recv() => Step::Command(command),
                dom_event = self.dom_events.recv() => Step::Dom(dom_event),
                () = sleep_until_deadline(deadline), if deadline.is_some() => Step::HoverFire,
            };

            match step {
                Step::Command(None) | Step::Dom(None) => break,

                Step::Command(Some(command)) => {
                    if let Some(event) = self.apply_command(&command, &mut hover) {
                        messenger.broadcast(&event);
                    }
                }

                Step::Dom(Some(dom_event)) => {
                    let (flow, event) = self.apply_dom_event(dom_event, &mut hover);
                    if let Some(event) = event {
                        messenger.broadcast(&event);
                    }
                    if flow == Flow::Exit {
                        break;
                    }
                }

                Step::HoverFire => {
                    if let Some(target) = hover.take() {
                        self.selector.hover(&mut *self.page, target);
                    }
                }
            }
        }

        debug!("Agent event loop terminated");
        messenger.shutdown();
        accept_task.abort();
        Ok(())
    }

    /// Applies one host command, returning the event to report.
    fn apply_command(
        &mut self,
        command: &HostCommand,
        hover: &mut HoverSlot,
    ) -> Option<AgentEvent> {
        match command {
            HostCommand::Navigation { action } => {
                self.reconciler.handle_action(&mut *self.page, *action)
            }
            _ => {
                self.selector.handle_command(&mut *self.page, command);
                // Deactivation invalidates any in-flight debounce.
                if !self.selector.is_active() {
                    hover.cancel();
                }
                None
            }
        }
    }

    /// Applies one raw DOM event.
    fn apply_dom_event(
        &mut self,
        event: DomEvent,
        hover: &mut HoverSlot,
    ) -> (Flow, Option<AgentEvent>) {
        match event {
            DomEvent::Ready => (Flow::Continue, None),

            DomEvent::PointerOver(target) => {
                if self.selector.is_active() {
                    hover.arm(target, self.options.debounce);
                }
                (Flow::Continue, None)
            }

            DomEvent::PointerOut(target) => {
                self.selector.pointer_out(&mut *self.page, target);
                (Flow::Continue, None)
            }

            DomEvent::Click(target) => {
                (Flow::Continue, self.selector.click(&mut *self.page, target))
            }

            DomEvent::PopState => (
                Flow::Continue,
                self.reconciler.handle_pop_state(&mut *self.page),
            ),

            DomEvent::LocationChanged => (
                Flow::Continue,
                self.reconciler.record_navigation(&mut *self.page),
            ),

            DomEvent::RootRendered => {
                self.selector.on_root_rendered(&mut *self.page);
                (Flow::Continue, None)
            }

            DomEvent::Unload => {
                debug!("Frame unloading");
                self.teardown(hover);
                (Flow::Exit, None)
            }
        }
    }

    fn teardown(&mut self, hover: &mut HoverSlot) {
        hover.cancel();
        if self.selector.is_active() {
            self.selector.toggle(&mut *self.page, false);
        }
    }
}

/// Sleeps until the debounce deadline; pends forever when disarmed (the
/// `select!` guard keeps the disarmed branch from being polled).
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures_util::StreamExt;
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    use crate::config::{ATTR_SOURCE, AgentOptions};
    use crate::page::fake::FakePage;
    use crate::protocol::{NavigationAction, TogglePayload};

    fn built_agent(page: FakePage) -> (Agent, mpsc::UnboundedSender<DomEvent>) {
        let (dom_tx, dom_rx) = mpsc::unbounded_channel();
        let agent = Agent::builder()
            .page(page)
            .dom_events(dom_rx)
            .build()
            .expect("build");
        (agent, dom_tx)
    }

    #[test]
    fn test_builder_requires_page() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let err = Agent::builder().dom_events(rx).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_requires_dom_events() {
        let err = Agent::builder().page(FakePage::new()).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_validates_options() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let err = Agent::builder()
            .with_options(AgentOptions::new().with_allowed_origins(Vec::<String>::new()))
            .page(FakePage::new())
            .dom_events(rx)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_hover_slot_keeps_latest_target() {
        let mut slot = HoverSlot::default();
        slot.arm(NodeId::new(1), Duration::from_millis(10));
        slot.arm(NodeId::new(2), Duration::from_millis(10));

        assert_eq!(slot.take(), Some(NodeId::new(2)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_hover_slot_cancel() {
        let mut slot = HoverSlot::default();
        slot.arm(NodeId::new(1), Duration::from_millis(10));
        slot.cancel();

        assert!(slot.deadline().is_none());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_pointer_events_only_arm_while_active() {
        let (mut agent, _dom_tx) = built_agent(FakePage::new());
        let mut hover = HoverSlot::default();

        agent.apply_dom_event(DomEvent::PointerOver(NodeId::new(1)), &mut hover);
        assert!(hover.deadline().is_none());

        agent.apply_command(
            &HostCommand::ToggleSelector {
                payload: TogglePayload { is_active: true },
            },
            &mut hover,
        );
        agent.apply_dom_event(DomEvent::PointerOver(NodeId::new(1)), &mut hover);
        assert!(hover.deadline().is_some());
    }

    #[test]
    fn test_deactivation_cancels_pending_hover() {
        let (mut agent, _dom_tx) = built_agent(FakePage::new());
        let mut hover = HoverSlot::default();

        agent.apply_command(
            &HostCommand::ToggleSelector {
                payload: TogglePayload { is_active: true },
            },
            &mut hover,
        );
        agent.apply_dom_event(DomEvent::PointerOver(NodeId::new(1)), &mut hover);
        assert!(hover.deadline().is_some());

        agent.apply_command(
            &HostCommand::ToggleSelector {
                payload: TogglePayload { is_active: false },
            },
            &mut hover,
        );
        assert!(hover.deadline().is_none());
    }

    #[test]
    fn test_click_reports_selection() {
        let mut page = FakePage::new();
        let node = page.add_element("button");
        page.set_attribute(node, ATTR_SOURCE, "cta.tsx:3:1");
        let (mut agent, _dom_tx) = built_agent(page);
        let mut hover = HoverSlot::default();

        agent.apply_command(
            &HostCommand::ToggleSelector {
                payload: TogglePayload { is_active: true },
            },
            &mut hover,
        );
        let (flow, event) = agent.apply_dom_event(DomEvent::Click(node), &mut hover);

        assert_eq!(flow, Flow::Continue);
        assert!(matches!(event, Some(AgentEvent::ElementSelected { .. })));
    }

    #[test]
    fn test_navigation_command_routes_to_reconciler() {
        let mut page = FakePage::new();
        page.set_url("http://a/");
        let (mut agent, _dom_tx) = built_agent(page);
        let mut hover = HoverSlot::default();

        agent.reconciler.initialize(&mut *agent.page);

        // At position 0 a back action is a no-op: no report.
        let event = agent.apply_command(
            &HostCommand::Navigation {
                action: NavigationAction::Back,
            },
            &mut hover,
        );
        assert!(event.is_none());
    }

    #[test]
    fn test_unload_exits_and_deactivates() {
        let (mut agent, _dom_tx) = built_agent(FakePage::new());
        let mut hover = HoverSlot::default();

        agent.apply_command(
            &HostCommand::ToggleSelector {
                payload: TogglePayload { is_active: true },
            },
            &mut hover,
        );
        let (flow, _) = agent.apply_dom_event(DomEvent::Unload, &mut hover);

        assert_eq!(flow, Flow::Exit);
        assert!(!agent.selector.is_active());
    }

    #[tokio::test]
    async fn test_run_is_inert_when_top_level() {
        let mut page = FakePage::new();
        page.embedded = false;
        let (agent, _dom_tx) = built_agent(page);

        timeout(Duration::from_secs(5), agent.run())
            .await
            .expect("no timeout")
            .expect("clean exit");
    }

    #[tokio::test]
    async fn test_run_exits_on_unload() {
        let (agent, dom_tx) = built_agent(FakePage::new());

        let handle = tokio::spawn(agent.run());
        dom_tx.send(DomEvent::Unload).expect("send");

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("no timeout")
            .expect("join")
            .expect("clean exit");
    }

    #[tokio::test]
    async fn test_run_reports_pop_state_to_connected_host() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let options = AgentOptions::new();
        let (dom_tx, dom_rx) = mpsc::unbounded_channel();

        // Fixed ephemeral port discovered after bind is racy to plumb out
        // of run(), so bind a throwaway listener first to pick a port.
        let probe = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("probe bind");
        let port = probe.local_addr().expect("addr").port();
        drop(probe);

        let agent = Agent::builder()
            .with_options(options.with_port(port))
            .page(FakePage::new())
            .dom_events(dom_rx)
            .build()
            .expect("build");
        let handle = tokio::spawn(agent.run());

        // Connect as the host with the allow-listed origin.
        let mut client = None;
        for _ in 0..50 {
            let mut request = format!("ws://127.0.0.1:{port}")
                .into_client_request()
                .expect("request");
            request
                .headers_mut()
                .insert("Origin", "http://localhost:8081".parse().expect("header"));
            match connect_async(request).await {
                Ok((stream, _)) => {
                    client = Some(stream);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
        let mut client = client.expect("host connected");

        // Give the accept loop time to register the link, then trigger a
        // reconciliation that always reports.
        tokio::time::sleep(Duration::from_millis(200)).await;
        dom_tx.send(DomEvent::PopState).expect("send");

        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no timeout")
            .expect("frame")
            .expect("ok frame");
        match frame {
            Message::Text(text) => assert!(text.contains("navigation-state")),
            other => panic!("unexpected frame: {other:?}"),
        }

        dom_tx.send(DomEvent::Unload).expect("send");
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("no timeout")
            .expect("join")
            .expect("clean exit");
    }
}
