//! # Duel Arena Server
//!
//! Back end for a two-player real-time game: pairs players into duels,
//! relays their input to each other and keeps a global top-3 leaderboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DUEL ARENA SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  wire/           - Binary protocol                           │
//! │  ├── codec.rs    - u8 / u32 LE / length-prefixed strings     │
//! │  └── message.rs  - Tagged messages and their layouts         │
//! │                                                              │
//! │  lobby/          - Protocol core (synchronous, no I/O)       │
//! │  ├── directory.rs   - Per-connection name and opponent       │
//! │  ├── matchmaking.rs - FIFO of waiting players                │
//! │  ├── leaderboard.rs - Bounded top-3 with cached minimum      │
//! │  ├── transport.rs   - Send/close capability                  │
//! │  └── dispatcher.rs  - Routing, pairing, relay, close cascade │
//! │                                                              │
//! │  network/        - WebSocket transport (tokio)               │
//! │  ├── server.rs   - Listener, connection tasks, lobby task    │
//! │  ├── channel.rs  - Channel-backed transport                  │
//! │  └── config.rs   - Server configuration                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Event Model
//!
//! Connection tasks only move bytes. All lobby state lives in one task that
//! handles connect, message and close events one at a time, so the core needs
//! no locks. Closing either player of a duel closes the other one too.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod lobby;
pub mod network;
pub mod wire;

// Re-export commonly used types
pub use lobby::{ConnectionId, Dispatcher, Leaderboard, LobbyStats, Transport};
pub use network::{GameServer, GameServerError, ServerConfig};
pub use wire::{Deserializer, NetworkMessage, Serializer, WireError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
