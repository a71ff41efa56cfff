//! Network Layer
//!
//! WebSocket transport adapter: accepts connections, turns socket activity
//! into lobby events and delivers the lobby's outbound frames.

pub mod channel;
pub mod config;
pub mod server;

pub use channel::{ChannelTransport, Outbound};
pub use config::ServerConfig;
pub use server::{GameServer, GameServerError, LobbyEvent};
