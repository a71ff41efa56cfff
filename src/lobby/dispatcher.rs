//! Message Dispatcher
//!
//! Owns all lobby state and reacts to transport events. Every handler runs
//! to completion before the next event is processed, so none of the state
//! here needs locking.

use tracing::{debug, info, warn};

use super::directory::SessionDirectory;
use super::leaderboard::Leaderboard;
use super::matchmaking::PendingQueue;
use super::transport::{ConnectionId, Transport};
use crate::wire::NetworkMessage;

/// Point-in-time lobby counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LobbyStats {
    /// Connections that have sent at least one valid message.
    pub connections: usize,
    /// Connections waiting for an opponent.
    pub waiting: usize,
    /// Connections in a session.
    pub paired: usize,
    /// Ranked leaderboard entries.
    pub leaderboard_entries: usize,
}

/// Routes decoded messages to matchmaking, relay and the leaderboard.
pub struct Dispatcher<T: Transport> {
    directory: SessionDirectory,
    queue: PendingQueue,
    leaderboard: Leaderboard,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher sending through `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            directory: SessionDirectory::new(),
            queue: PendingQueue::new(),
            leaderboard: Leaderboard::new(),
            transport,
        }
    }

    /// Transport used for outbound traffic.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport (registration of new connections).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Session directory.
    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// Pending queue.
    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Leaderboard.
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Current counters.
    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            connections: self.directory.len(),
            waiting: self.queue.len(),
            paired: self.directory.paired_count(),
            leaderboard_entries: self.leaderboard.len(),
        }
    }

    /// A connection opened. State is created on its first message.
    pub fn on_connect(&mut self, connection: ConnectionId) {
        debug!("Connection {} opened", connection);
    }

    /// A binary frame arrived. Undecodable frames are dropped.
    pub fn on_message(&mut self, connection: ConnectionId, frame: &[u8]) {
        let message = match NetworkMessage::from_bytes(frame) {
            Ok(m) => m,
            Err(e) => {
                debug!(
                    "Dropping frame from {}: {} ({})",
                    connection,
                    e,
                    hex::encode(&frame[..frame.len().min(32)])
                );
                return;
            }
        };

        self.directory.get_or_create(connection);

        let tag = message.tag();
        match message {
            NetworkMessage::Login { name } => self.on_login(connection, name),
            NetworkMessage::InputChanged { payload } => self.on_input(connection, payload),
            NetworkMessage::ScoreUpdate { name, score } => {
                self.on_score_update(connection, &name, score)
            }
            NetworkMessage::LeaderboardUpdate { .. } | NetworkMessage::SessionStart { .. } => {
                debug!("Ignoring server-only {:?} from {}", tag, connection);
            }
        }
    }

    /// A connection closed. A paired opponent is closed with it.
    pub fn on_close(&mut self, connection: ConnectionId) {
        match self.directory.remove(connection) {
            Some(state) => {
                if let Some(opponent) = state.opponent() {
                    info!(
                        "Connection {} closed, ending session with {}",
                        connection, opponent
                    );
                    self.directory.remove(opponent);
                    self.transport.close(opponent);
                } else if self.queue.remove(connection) {
                    info!("Connection {} left the queue", connection);
                } else {
                    debug!("Connection {} closed", connection);
                }
            }
            None => {
                self.queue.remove(connection);
                debug!("Connection {} closed without state", connection);
            }
        }
    }

    fn on_login(&mut self, connection: ConnectionId, name: String) {
        info!("Connection {} logged in as {:?}", connection, name);

        let state = self.directory.get_or_create(connection);
        state.name = Some(name);
        if state.is_paired() || self.queue.contains(connection) {
            debug!("Connection {} renamed, matchmaking unchanged", connection);
            return;
        }

        let other = match self.queue.pop_oldest() {
            Some(other) => other,
            None => {
                self.queue.push(connection);
                debug!("Connection {} waiting for an opponent", connection);
                return;
            }
        };

        self.directory.pair(connection, other);

        let snapshot: Vec<NetworkMessage> = self
            .leaderboard
            .entries()
            .map(|entry| NetworkMessage::LeaderboardUpdate {
                name: entry.name.clone(),
                score: entry.score,
                removed_name: String::new(),
            })
            .collect();
        for message in &snapshot {
            self.send(connection, message);
            self.send(other, message);
        }

        let names = [
            self.directory.name_of(other).to_string(),
            self.directory.name_of(connection).to_string(),
        ];
        info!("Session started: {:?} vs {:?}", names[0], names[1]);

        self.send(
            other,
            &NetworkMessage::SessionStart {
                player_index: 0,
                names: names.clone(),
            },
        );
        self.send(
            connection,
            &NetworkMessage::SessionStart {
                player_index: 1,
                names,
            },
        );
    }

    fn on_input(&mut self, connection: ConnectionId, payload: Vec<u8>) {
        match self.directory.opponent_of(connection) {
            Some(opponent) => {
                self.send(opponent, &NetworkMessage::InputChanged { payload });
            }
            None => debug!("Input from {} has no opponent, dropped", connection),
        }
    }

    fn on_score_update(&mut self, connection: ConnectionId, name: &str, score: u32) {
        let Some(change) = self.leaderboard.submit(connection, name, score) else {
            debug!("Score {} from {} does not rank", score, connection);
            return;
        };

        info!(
            "Leaderboard: {:?} ranked with {} (removed {:?})",
            change.name, change.score, change.removed_name
        );

        let message = NetworkMessage::from(change);
        let recipients: Vec<ConnectionId> = self.directory.connections().collect();
        for recipient in recipients {
            self.send(recipient, &message);
        }
    }

    fn send(&mut self, to: ConnectionId, message: &NetworkMessage) {
        match message.to_bytes() {
            Ok(frame) => self.transport.send(to, frame),
            Err(e) => warn!("Failed to encode {:?} for {}: {}", message.tag(), to, e),
        }
    }
}
