//! Per-connection event loop.
//!
//! Each accepted host connection gets a [`HostLink`]: a spawned task that
//! owns the socket, forwards validated inbound commands to the agent in
//! strict arrival order, and writes outbound events.
//!
//! Inbound frames that do not parse into a
//! [`HostCommand`](crate::protocol::HostCommand) are silently ignored —
//! untrusted peers routinely probe with unrelated messages, and no
//! response is ever sent for malformed input.

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{AgentEvent, HostCommand};

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the link event loop.
enum LinkCommand {
    /// Write a serialized event frame.
    Send(String),
    /// Close the socket and exit.
    Shutdown,
}

// ============================================================================
// HostLink
// ============================================================================

/// A live connection to one host origin.
///
/// Cloneable handle; the socket lives in the spawned event loop task.
#[derive(Clone)]
pub struct HostLink {
    /// The connection's validated origin (canonical form).
    origin: String,
    /// Channel into the event loop.
    command_tx: mpsc::UnboundedSender<LinkCommand>,
}

impl HostLink {
    /// Spawns the event loop for an upgraded connection.
    ///
    /// Validated inbound commands are forwarded on `inbound_tx`; the
    /// channel closing (agent gone) terminates the loop.
    pub fn spawn(
        ws_stream: WebSocketStream<TcpStream>,
        origin: impl Into<String>,
        inbound_tx: mpsc::UnboundedSender<HostCommand>,
    ) -> Self {
        let origin = origin.into();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            origin.clone(),
            command_rx,
            inbound_tx,
        ));

        Self { origin, command_tx }
    }

    /// The connection's validated origin.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns `true` while the event loop is still running.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Queues an event for delivery to this origin.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the event cannot be serialized
    /// - [`Error::ConnectionClosed`] if the event loop has exited
    pub fn send(&self, event: &AgentEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.command_tx
            .send(LinkCommand::Send(json))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Shuts the link down gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LinkCommand::Shutdown);
    }

    /// Event loop that owns the socket.
    async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        origin: String,
        mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
        inbound_tx: mpsc::UnboundedSender<HostCommand>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Inbound frames from the host
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match HostCommand::parse(&text) {
                                Some(command) => {
                                    trace!(
                                        origin = %origin,
                                        command = command.command_name(),
                                        "Inbound host command"
                                    );
                                    if inbound_tx.send(command).is_err() {
                                        debug!(origin = %origin, "Agent gone, closing link");
                                        break;
                                    }
                                }
                                // Untrusted input: drop without response.
                                None => trace!(origin = %origin, "Ignoring unrecognized frame"),
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(origin = %origin, "Host closed link");
                            break;
                        }

                        Some(Err(err)) => {
                            warn!(origin = %origin, error = %err, "Link error");
                            break;
                        }

                        None => {
                            debug!(origin = %origin, "Link stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Outbound events from the agent
                command = command_rx.recv() => {
                    match command {
                        Some(LinkCommand::Send(json)) => {
                            if let Err(err) = ws_write.send(Message::Text(json.into())).await {
                                warn!(origin = %origin, error = %err, "Failed to deliver event");
                                break;
                            }
                        }

                        Some(LinkCommand::Shutdown) | None => {
                            debug!(origin = %origin, "Link shutdown");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!(origin = %origin, "Link event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
