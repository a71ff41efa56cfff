//! Transport capability used by the lobby.
//!
//! The lobby never owns sockets. It refers to connections by [`ConnectionId`]
//! and asks the transport to deliver frames or close connections.

use std::fmt;

/// Opaque connection handle assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound half of a transport.
///
/// Both operations are best effort: targeting a connection that is already
/// gone must be a silent no-op.
pub trait Transport {
    /// Queue one binary frame for delivery.
    fn send(&mut self, connection: ConnectionId, frame: Vec<u8>);

    /// Terminate the connection.
    fn close(&mut self, connection: ConnectionId);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use crate::wire::NetworkMessage;

    /// Transport that records everything the lobby asks of it.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        pub sent: Vec<(ConnectionId, Vec<u8>)>,
        pub closed: Vec<ConnectionId>,
    }

    impl RecordingTransport {
        /// Decoded messages delivered to `connection`, in order.
        pub fn messages_to(&self, connection: ConnectionId) -> Vec<NetworkMessage> {
            self.sent
                .iter()
                .filter(|(to, _)| *to == connection)
                .map(|(_, frame)| NetworkMessage::from_bytes(frame).unwrap())
                .collect()
        }

        pub fn clear(&mut self) {
            self.sent.clear();
            self.closed.clear();
        }
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, connection: ConnectionId, frame: Vec<u8>) {
            self.sent.push((connection, frame));
        }

        fn close(&mut self, connection: ConnectionId) {
            self.closed.push(connection);
        }
    }
}
