//! WebSocket Game Server
//!
//! Accept loop and per-connection plumbing. The handshake carries an
//! optional `?token=` query parameter which is resolved into the
//! session's one-time auth binding; everything after that is JSON events
//! in both directions, routed through the orchestrator.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::network::auth::{authenticate, AuthConfig};
use crate::network::protocol::{ClientEvent, ServerEvent};
use crate::orchestrator::Orchestrator;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// The WebSocket front of the game server.
pub struct GameServer {
    config: ServerConfig,
    auth_config: AuthConfig,
    orchestrator: Arc<Orchestrator>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server around an orchestrator.
    pub fn new(
        config: ServerConfig,
        auth_config: AuthConfig,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            auth_config,
            orchestrator,
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("game server listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let live = self.orchestrator.sessions().session_count().await;
                            if live >= self.config.max_connections {
                                warn!(%addr, "connection limit reached, rejecting");
                                continue;
                            }
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {e}");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Spawn the task owning one client connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let orchestrator = self.orchestrator.clone();
        let auth_config = self.auth_config.clone();
        let idle_timeout = self.config.idle_timeout;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut token: Option<String> = None;
            let ws_stream = {
                let callback = |req: &Request, response: Response| {
                    token = req.uri().query().and_then(extract_token);
                    Ok(response)
                };
                match accept_hdr_async(stream, callback).await {
                    Ok(ws) => ws,
                    Err(e) => {
                        debug!(%addr, "websocket handshake failed: {e}");
                        return;
                    }
                }
            };

            let binding = authenticate(token.as_deref(), &auth_config);
            let (session_id, mut outbound) = orchestrator.connect(binding).await;
            info!(%addr, session = %session_id, "client connected");

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();

            // Writer task: drain the session channel onto the wire.
            let writer = tokio::spawn(async move {
                while let Some(event) = outbound.recv().await {
                    let text = match event.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            error!("failed to serialize event: {e}");
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = tokio::time::timeout(idle_timeout, ws_receiver.next()) => {
                        match msg {
                            Err(_) => {
                                debug!(session = %session_id, "idle timeout, closing");
                                break;
                            }
                            Ok(Some(Ok(Message::Text(text)))) => {
                                match ClientEvent::from_json(&text) {
                                    Ok(event) => {
                                        orchestrator.handle_event(&session_id, event).await;
                                    }
                                    Err(e) => {
                                        debug!(session = %session_id, "unparseable event: {e}");
                                    }
                                }
                            }
                            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                                debug!(session = %session_id, "client closed connection");
                                break;
                            }
                            Ok(Some(Err(e))) => {
                                debug!(session = %session_id, "websocket error: {e}");
                                break;
                            }
                            // Pings are answered by the protocol layer.
                            Ok(Some(Ok(_))) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        orchestrator
                            .sessions()
                            .send(&session_id, ServerEvent::Shutdown {
                                reason: "server shutting down".to_string(),
                            })
                            .await;
                        break;
                    }
                }
            }

            orchestrator.handle_disconnect(&session_id).await;
            orchestrator.sessions().unregister(&session_id).await;
            writer.abort();
            info!(%addr, session = %session_id, "client cleaned up");
        });
    }

    /// Signal every connection task and the accept loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Live connection count.
    pub async fn connection_count(&self) -> usize {
        self.orchestrator.sessions().session_count().await
    }

    /// Live room count.
    pub async fn room_count(&self) -> usize {
        self.orchestrator.store().room_count().await
    }
}

/// Pull `token=...` out of a query string.
fn extract_token(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("token=").map(str::to_string))
}
