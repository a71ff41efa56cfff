//! Channel-backed transport.
//!
//! Each live connection registers a bounded outbound channel; its socket task
//! drains the channel and writes to the WebSocket. A connection whose outbox
//! fills up is not reading fast enough and gets disconnected.

use std::collections::BTreeMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::lobby::{ConnectionId, Transport};

/// Frames buffered per connection before it is treated as stalled.
pub const OUTBOX_CAPACITY: usize = 64;

/// Instruction for a connection's socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send a binary frame.
    Frame(Vec<u8>),
    /// Close the WebSocket.
    Close,
}

/// [`Transport`] writing into per-connection channels.
#[derive(Debug, Default)]
pub struct ChannelTransport {
    outboxes: BTreeMap<ConnectionId, mpsc::Sender<Outbound>>,
}

impl ChannelTransport {
    /// Create with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start routing frames for `connection` into `outbox`.
    pub fn register(&mut self, connection: ConnectionId, outbox: mpsc::Sender<Outbound>) {
        self.outboxes.insert(connection, outbox);
    }

    /// Stop routing frames for `connection`.
    pub fn unregister(&mut self, connection: ConnectionId) {
        self.outboxes.remove(&connection);
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    fn push(&mut self, connection: ConnectionId, item: Outbound) {
        let Some(outbox) = self.outboxes.get(&connection) else {
            debug!("No outbox for {}", connection);
            return;
        };

        match outbox.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Dropping the only sender ends the socket task once the
                // buffered frames are flushed.
                warn!("Outbox for {} full, disconnecting", connection);
                self.outboxes.remove(&connection);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Outbox for {} already closed", connection);
            }
        }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, connection: ConnectionId, frame: Vec<u8>) {
        self.push(connection, Outbound::Frame(frame));
    }

    fn close(&mut self, connection: ConnectionId) {
        self.push(connection, Outbound::Close);
    }
}
