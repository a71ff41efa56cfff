//! Session Directory
//!
//! Per-connection state: display name and current opponent.
//! Opponent links are only written by [`SessionDirectory::pair`] and cleared
//! by [`SessionDirectory::remove`], which keeps pairing symmetric.

use std::collections::BTreeMap;

use super::transport::ConnectionId;

/// State for one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Name from the latest login, if any.
    pub name: Option<String>,
    /// Paired opponent.
    opponent: Option<ConnectionId>,
}

impl ConnectionState {
    /// Current opponent.
    pub fn opponent(&self) -> Option<ConnectionId> {
        self.opponent
    }

    /// Whether this connection is in a session.
    pub fn is_paired(&self) -> bool {
        self.opponent.is_some()
    }
}

/// All known connections.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    states: BTreeMap<ConnectionId, ConnectionState>,
}

impl SessionDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `id`, created on first use.
    pub fn get_or_create(&mut self, id: ConnectionId) -> &mut ConnectionState {
        self.states.entry(id).or_default()
    }

    /// State for `id`, if known.
    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionState> {
        self.states.get(&id)
    }

    /// Display name of `id`, or empty if unknown.
    pub fn name_of(&self, id: ConnectionId) -> &str {
        self.states
            .get(&id)
            .and_then(|s| s.name.as_deref())
            .unwrap_or("")
    }

    /// Opponent of `id`, if paired.
    pub fn opponent_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.states.get(&id).and_then(ConnectionState::opponent)
    }

    /// Pair two connections with each other.
    pub fn pair(&mut self, a: ConnectionId, b: ConnectionId) {
        debug_assert_ne!(a, b, "a connection cannot be its own opponent");
        self.get_or_create(a).opponent = Some(b);
        self.get_or_create(b).opponent = Some(a);
    }

    /// Forget `id`. If it was paired, the opponent's link is cleared too.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionState> {
        let state = self.states.remove(&id)?;
        if let Some(opponent) = state.opponent {
            if let Some(other) = self.states.get_mut(&opponent) {
                if other.opponent == Some(id) {
                    other.opponent = None;
                }
            }
        }
        Some(state)
    }

    /// Every known connection.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.states.keys().copied()
    }

    /// Number of known connections.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no connection is known.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of connections currently in a session.
    pub fn paired_count(&self) -> usize {
        self.states.values().filter(|s| s.is_paired()).count()
    }

    /// Check that every opponent link is mirrored.
    pub fn is_symmetric(&self) -> bool {
        self.states.iter().all(|(id, state)| match state.opponent {
            Some(other) => self.opponent_of(other) == Some(*id),
            None => true,
        })
    }
}
