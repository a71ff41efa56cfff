//! Leaderboard
//!
//! Global top-3 of submitted scores, keyed by the submitting connection.
//! The lowest score is cached so a full board can reject most submissions
//! with one comparison.
//!
//! Entries outlive their connection; only a better score pushes them out.
//! When several entries share the minimum, which one is evicted follows map
//! iteration order and is not part of the contract.

use std::collections::BTreeMap;

use super::transport::ConnectionId;
use crate::wire::NetworkMessage;

/// Maximum number of ranked entries.
pub const CAPACITY: usize = 3;

/// One ranked score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Connection that submitted the score.
    pub key: ConnectionId,
    /// Player name at submission time.
    pub name: String,
    /// Submitted score.
    pub score: u32,
}

/// A change to broadcast after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardChange {
    /// Name of the new entry.
    pub name: String,
    /// Score of the new entry.
    pub score: u32,
    /// Evicted name, or empty if nothing was evicted.
    pub removed_name: String,
}

impl From<LeaderboardChange> for NetworkMessage {
    fn from(change: LeaderboardChange) -> Self {
        NetworkMessage::LeaderboardUpdate {
            name: change.name,
            score: change.score,
            removed_name: change.removed_name,
        }
    }
}

/// Bounded ranked set.
#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: BTreeMap<ConnectionId, LeaderboardEntry>,
    /// Lowest score among `entries`; meaningless while empty.
    min_score: u32,
}

impl Leaderboard {
    /// Create an empty leaderboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a score.
    ///
    /// Below capacity the entry for `key` is inserted or overwritten. At
    /// capacity the score must beat the current minimum, and one minimum
    /// entry is evicted to make room. Returns `None` if nothing changed.
    pub fn submit(
        &mut self,
        key: ConnectionId,
        name: &str,
        score: u32,
    ) -> Option<LeaderboardChange> {
        let mut removed_name = String::new();

        if self.entries.len() >= CAPACITY {
            if score <= self.min_score {
                return None;
            }

            let evicted = self
                .entries
                .iter()
                .find(|(_, entry)| entry.score == self.min_score)
                .map(|(key, _)| *key)?;

            if let Some(entry) = self.entries.remove(&evicted) {
                removed_name = entry.name;
            }
        }

        self.entries.insert(
            key,
            LeaderboardEntry {
                key,
                name: name.to_string(),
                score,
            },
        );
        self.recompute_min();

        Some(LeaderboardChange {
            name: name.to_string(),
            score,
            removed_name,
        })
    }

    fn recompute_min(&mut self) {
        self.min_score = self
            .entries
            .values()
            .map(|entry| entry.score)
            .min()
            .unwrap_or(0);
    }

    /// Cached minimum score, if any entry exists.
    pub fn min_score(&self) -> Option<u32> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.min_score)
        }
    }

    /// Current entries.
    pub fn entries(&self) -> impl Iterator<Item = &LeaderboardEntry> + '_ {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the board is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn filled() -> Leaderboard {
        let mut board = Leaderboard::new();
        board.submit(id(1), "p1", 10);
        board.submit(id(2), "p2", 20);
        board.submit(id(3), "p3", 15);
        board
    }

    #[test]
    fn test_insert_below_capacity() {
        let mut board = Leaderboard::new();
        assert_eq!(board.min_score(), None);

        for (n, score) in [(1, 10), (2, 20), (3, 15)] {
            let change = board.submit(id(n), &format!("p{n}"), score).unwrap();
            assert_eq!(change.score, score);
            assert_eq!(change.removed_name, "");
        }

        assert_eq!(board.len(), 3);
        assert_eq!(board.min_score(), Some(10));
    }

    #[test]
    fn test_higher_score_evicts_minimum() {
        let mut board = filled();

        let change = board.submit(id(4), "p4", 12).unwrap();
        assert_eq!(change.name, "p4");
        assert_eq!(change.removed_name, "p1");
        assert_eq!(board.len(), 3);
        assert_eq!(board.min_score(), Some(12));
        assert!(board.entries().all(|e| e.key != id(1)));
    }

    #[test]
    fn test_lower_score_is_rejected() {
        let mut board = filled();
        board.submit(id(4), "p4", 12);

        assert!(board.submit(id(5), "p5", 5).is_none());
        assert!(board.submit(id(5), "p5", 12).is_none());
        assert_eq!(board.min_score(), Some(12));
    }

    #[test]
    fn test_overwrite_below_capacity() {
        let mut board = Leaderboard::new();
        board.submit(id(1), "Ann", 30);
        board.submit(id(1), "Ann", 5);

        assert_eq!(board.len(), 1);
        assert_eq!(board.min_score(), Some(5));
    }

    #[test]
    fn test_ranked_player_improving_on_full_board_shrinks_it() {
        let mut board = Leaderboard::new();
        board.submit(id(1), "a", 10);
        board.submit(id(2), "b", 30);
        board.submit(id(3), "c", 40);

        let change = board.submit(id(3), "c", 50).unwrap();
        assert_eq!(change.removed_name, "a");
        assert_eq!(board.len(), 2);
        assert_eq!(board.min_score(), Some(30));

        let scores: Vec<(ConnectionId, u32)> = board.entries().map(|e| (e.key, e.score)).collect();
        assert_eq!(scores, vec![(id(2), 30), (id(3), 50)]);
    }

    #[test]
    fn test_tied_minimum_evicts_exactly_one() {
        let mut board = Leaderboard::new();
        board.submit(id(1), "a", 7);
        board.submit(id(2), "b", 7);
        board.submit(id(3), "c", 9);

        let change = board.submit(id(4), "d", 8).unwrap();
        assert!(change.removed_name == "a" || change.removed_name == "b");
        assert_eq!(board.len(), 3);
        assert_eq!(board.min_score(), Some(7));
    }

    #[test]
    fn test_into_message() {
        let change = LeaderboardChange {
            name: "Ann".into(),
            score: 3,
            removed_name: String::new(),
        };
        assert_eq!(
            NetworkMessage::from(change),
            NetworkMessage::LeaderboardUpdate {
                name: "Ann".into(),
                score: 3,
                removed_name: String::new(),
            }
        );
    }

    proptest! {
        #[test]
        fn prop_bounded_and_min_cached(ops in prop::collection::vec((0u64..8, 0u32..50), 0..64)) {
            let mut board = Leaderboard::new();
            for (key, score) in ops {
                board.submit(id(key), "p", score);

                prop_assert!(board.len() <= CAPACITY);
                let true_min = board.entries().map(|e| e.score).min();
                prop_assert_eq!(board.min_score(), true_min);
            }
        }
    }
}
