//! Matchmaking Queue
//!
//! Strict FIFO of connections waiting for an opponent.

use std::collections::VecDeque;

use super::transport::ConnectionId;

/// Connections that logged in and are not yet paired.
#[derive(Debug, Default)]
pub struct PendingQueue {
    waiting: VecDeque<ConnectionId>,
}

impl PendingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already waiting. Returns whether it was added.
    pub fn push(&mut self, id: ConnectionId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.waiting.push_back(id);
        true
    }

    /// Take the connection that has waited longest.
    pub fn pop_oldest(&mut self) -> Option<ConnectionId> {
        self.waiting.pop_front()
    }

    /// Remove `id` wherever it sits. Returns whether it was waiting.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        match self.waiting.iter().position(|&w| w == id) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `id` is waiting.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.waiting.contains(&id)
    }

    /// Number of waiting connections.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Waiting connections, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.waiting.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = PendingQueue::new();
        queue.push(id(1));
        queue.push(id(2));
        queue.push(id(3));

        assert_eq!(queue.pop_oldest(), Some(id(1)));
        assert_eq!(queue.pop_oldest(), Some(id(2)));
        assert_eq!(queue.pop_oldest(), Some(id(3)));
        assert_eq!(queue.pop_oldest(), None);
    }

    #[test]
    fn test_no_duplicates() {
        let mut queue = PendingQueue::new();
        assert!(queue.push(id(1)));
        assert!(!queue.push(id(1)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_remove_from_middle() {
        let mut queue = PendingQueue::new();
        for n in 1..=3 {
            queue.push(id(n));
        }

        assert!(queue.remove(id(2)));
        assert!(!queue.remove(id(2)));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![id(1), id(3)]);
    }
}
