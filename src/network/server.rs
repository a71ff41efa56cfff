//! WebSocket Game Server
//!
//! Async WebSocket transport for the lobby.
//! Each connection runs in its own task and forwards events to a single
//! lobby task, which owns the [`Dispatcher`] and processes one event at a time.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::lobby::{ConnectionId, Dispatcher, LobbyStats};
use crate::network::channel::{ChannelTransport, Outbound, OUTBOX_CAPACITY};
use crate::network::config::ServerConfig;

/// Events buffered for the lobby task before connection tasks wait.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Event delivered from a connection task to the lobby task.
#[derive(Debug)]
pub enum LobbyEvent {
    /// WebSocket handshake completed.
    Connected {
        /// Assigned connection id.
        id: ConnectionId,
        /// Peer address.
        addr: SocketAddr,
        /// Channel the connection task drains.
        outbox: mpsc::Sender<Outbound>,
    },
    /// Binary frame received.
    Frame {
        /// Sender.
        id: ConnectionId,
        /// Raw frame.
        data: Vec<u8>,
    },
    /// Connection ended, for whatever reason.
    Closed {
        /// Connection that ended.
        id: ConnectionId,
    },
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Next connection id.
    next_id: AtomicU64,
    /// Open sockets (including those still handshaking).
    active: Arc<AtomicUsize>,
    /// Latest lobby counters, published by the lobby task.
    stats_tx: Arc<watch::Sender<LobbyStats>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (stats_tx, _) = watch::channel(LobbyStats::default());

        Self {
            config,
            next_id: AtomicU64::new(1),
            active: Arc::new(AtomicUsize::new(0)),
            stats_tx: Arc::new(stats_tx),
            shutdown_tx,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Game server listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let stats_tx = self.stats_tx.clone();
        tokio::spawn(async move {
            Self::run_lobby(events_rx, stats_tx).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                            info!("New connection {} from {}", id, addr);
                            self.handle_connection(stream, addr, id, events_tx.clone());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        id: ConnectionId,
        events: mpsc::Sender<LobbyEvent>,
    ) {
        let active = self.active.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        active.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    active.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (outbox_tx, mut outbox_rx) = mpsc::channel::<Outbound>(OUTBOX_CAPACITY);

            if events
                .send(LobbyEvent::Connected { id, addr, outbox: outbox_tx })
                .await
                .is_ok()
            {
                loop {
                    tokio::select! {
                        msg = ws_receiver.next() => {
                            match msg {
                                Some(Ok(Message::Binary(data))) => {
                                    if events.send(LobbyEvent::Frame { id, data }).await.is_err() {
                                        break;
                                    }
                                }
                                Some(Ok(Message::Text(_))) => {
                                    debug!("Ignoring text frame from {}", id);
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    debug!("Client {} disconnected", id);
                                    break;
                                }
                                Some(Err(e)) => {
                                    warn!("WebSocket error for {}: {}", id, e);
                                    break;
                                }
                                _ => {}
                            }
                        }
                        out = outbox_rx.recv() => {
                            match out {
                                Some(Outbound::Frame(frame)) => {
                                    if let Err(e) = ws_sender.send(Message::Binary(frame)).await {
                                        debug!("Send to {} failed: {}", id, e);
                                        break;
                                    }
                                }
                                Some(Outbound::Close) | None => {
                                    let _ = ws_sender.send(Message::Close(None)).await;
                                    break;
                                }
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            let _ = ws_sender.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }

                let _ = events.send(LobbyEvent::Closed { id }).await;
            }

            active.fetch_sub(1, Ordering::SeqCst);
            info!("Connection {} ({}) closed", id, addr);
        });
    }

    /// Run the lobby: the only place lobby state is touched.
    ///
    /// Never awaits a connection task, so a full event queue only slows
    /// readers down.
    async fn run_lobby(
        mut events: mpsc::Receiver<LobbyEvent>,
        stats: Arc<watch::Sender<LobbyStats>>,
    ) {
        let mut dispatcher = Dispatcher::new(ChannelTransport::new());

        while let Some(event) = events.recv().await {
            match event {
                LobbyEvent::Connected { id, addr, outbox } => {
                    debug!("Registering {} ({})", id, addr);
                    dispatcher.transport_mut().register(id, outbox);
                    dispatcher.on_connect(id);
                }
                LobbyEvent::Frame { id, data } => {
                    dispatcher.on_message(id, &data);
                }
                LobbyEvent::Closed { id } => {
                    dispatcher.on_close(id);
                    dispatcher.transport_mut().unregister(id);
                }
            }

            stats.send_replace(dispatcher.stats());
        }

        debug!("Lobby stopped");
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get open connection count.
    pub fn connection_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Latest lobby counters.
    pub fn stats(&self) -> LobbyStats {
        *self.stats_tx.borrow()
    }

    /// Get active session count.
    pub fn session_count(&self) -> usize {
        self.stats().paired / 2
    }

    /// Get matchmaking queue size.
    pub fn queue_size(&self) -> usize {
        self.stats().waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::new(config);

        assert_eq!(server.connection_count(), 0);
        assert_eq!(server.session_count(), 0);
        assert_eq!(server.queue_size(), 0);
    }

    #[tokio::test]
    async fn test_server_shutdown_stops_serve() {
        let server = Arc::new(GameServer::new(ServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let runner = server.clone();
        let handle = tokio::spawn(async move { runner.serve(listener).await });

        // Let serve subscribe before signalling.
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("serve did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            bind_addr: taken.local_addr().unwrap(),
            ..Default::default()
        };

        let result = GameServer::new(config).run().await;
        assert!(matches!(result, Err(GameServerError::BindFailed(_))));
    }
}
