//! Lobby
//!
//! Synchronous protocol core: who is connected, who is waiting, who plays
//! whom, and the global leaderboard. It never touches sockets; all I/O goes
//! through the [`Transport`] capability.

pub mod directory;
pub mod dispatcher;
pub mod leaderboard;
pub mod matchmaking;
pub mod transport;

pub use directory::{ConnectionState, SessionDirectory};
pub use dispatcher::{Dispatcher, LobbyStats};
pub use leaderboard::{Leaderboard, LeaderboardChange, LeaderboardEntry, CAPACITY};
pub use matchmaking::PendingQueue;
pub use transport::{ConnectionId, Transport};
