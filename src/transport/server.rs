//! WebSocket listener with handshake gating.
//!
//! This module provides the WebSocket server the host editor connects to.
//! The origin gate runs inside the handshake callback: a connection whose
//! HTTP `Origin` header is missing or not allow-listed is refused with
//! `403 Forbidden` before any frame is exchanged.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::AllowedOrigins;

// ============================================================================
// HostListener
// ============================================================================

/// A bound WebSocket server awaiting host connections.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use overlay_agent::transport::{AllowedOrigins, HostListener};
///
/// let gate = AllowedOrigins::parse(&origins)?;
/// let listener = HostListener::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, gate).await?;
/// let (stream, origin) = listener.accept().await?;
/// ```
pub struct HostListener {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
    /// Origin gate applied at handshake.
    gate: AllowedOrigins,
}

impl HostListener {
    /// Binds a WebSocket server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16, gate: AllowedOrigins) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "Host listener bound");

        Ok(Self {
            listener,
            port: actual_port,
            gate,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Accepts one host connection and completes the gated handshake.
    ///
    /// # Returns
    ///
    /// The upgraded stream and the connection's validated origin.
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeRejected`] when the `Origin` header is missing
    ///   or not allow-listed
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    pub async fn accept(&self) -> Result<(WebSocketStream<TcpStream>, String)> {
        let (stream, addr) = self.listener.accept().await?;
        debug!(?addr, "TCP connection accepted");

        let accepted_origin: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let rejected_origin: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let gate = self.gate.clone();
        let callback = {
            let accepted_origin = Arc::clone(&accepted_origin);
            let rejected_origin = Arc::clone(&rejected_origin);

            move |request: &Request, response: Response| {
                let origin = request
                    .headers()
                    .get("origin")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);

                match origin {
                    Some(origin) if gate.permits(&origin) => {
                        *accepted_origin.lock() = Some(origin);
                        Ok(response)
                    }
                    other => {
                        *rejected_origin.lock() =
                            Some(other.unwrap_or_else(|| "<missing>".to_string()));

                        let mut refusal = ErrorResponse::new(None);
                        *refusal.status_mut() = StatusCode::FORBIDDEN;
                        Err(refusal)
                    }
                }
            }
        };

        match tokio_tungstenite::accept_hdr_async(stream, callback).await {
            Ok(ws_stream) => {
                let origin = accepted_origin
                    .lock()
                    .take()
                    .ok_or_else(|| Error::protocol("handshake completed without an origin"))?;

                info!(port = self.port, origin = %origin, "Host link established");
                Ok((ws_stream, origin))
            }
            Err(err) => {
                if let Some(origin) = rejected_origin.lock().take() {
                    warn!(origin = %origin, "Rejected host connection");
                    return Err(Error::handshake_rejected(origin));
                }
                Err(Error::connection(format!(
                    "WebSocket upgrade failed: {err}"
                )))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
