//! Wire Protocol
//!
//! Hand-rolled binary format shared with the browser client.
//! Layouts are fixed by the client schema, so nothing here goes through serde.

pub mod codec;
pub mod message;

pub use codec::{Deserializer, Serializer, WireError, MAX_STRING_LEN};
pub use message::{MessageTag, NetworkMessage};
