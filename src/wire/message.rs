//! Protocol Messages
//!
//! Every frame is `[tag: u8][fields...]`. Tag values and field order come
//! from the schema shared with the browser client and must not change.
//!
//! | Tag | Message           | Fields                                   |
//! |-----|-------------------|------------------------------------------|
//! | 1   | Login             | name: string                             |
//! | 2   | SessionStart      | player_index: u8, names: string, string  |
//! | 3   | InputChanged      | payload: remaining bytes (opaque)        |
//! | 4   | ScoreUpdate       | name: string, score: u32                 |
//! | 5   | LeaderboardUpdate | name: string, score: u32, removed: string|

use super::codec::{Deserializer, Serializer, WireError};

/// Leading byte identifying a message.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// Client announces its display name.
    Login = 1,
    /// Server tells both players their session has begun.
    SessionStart = 2,
    /// Gameplay input, relayed verbatim to the opponent.
    InputChanged = 3,
    /// Client reports a finished score.
    ScoreUpdate = 4,
    /// Server announces a leaderboard change.
    LeaderboardUpdate = 5,
}

impl MessageTag {
    /// Map a tag byte to a known message, if any.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Login),
            2 => Some(Self::SessionStart),
            3 => Some(Self::InputChanged),
            4 => Some(Self::ScoreUpdate),
            5 => Some(Self::LeaderboardUpdate),
            _ => None,
        }
    }
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMessage {
    /// Player identifies itself and asks for an opponent.
    Login {
        /// Display name.
        name: String,
    },

    /// Opaque gameplay input.
    InputChanged {
        /// Bytes after the tag, never interpreted by the server.
        payload: Vec<u8>,
    },

    /// Final score submitted by a player.
    ScoreUpdate {
        /// Display name.
        name: String,
        /// Score.
        score: u32,
    },

    /// One leaderboard row changed. An empty `removed_name` means nothing was evicted.
    LeaderboardUpdate {
        /// Name of the inserted or updated entry.
        name: String,
        /// Its score.
        score: u32,
        /// Name of the evicted entry, or empty.
        removed_name: String,
    },

    /// Session start notice.
    ///
    /// `names[0]` is always the player who was waiting first, for both recipients.
    SessionStart {
        /// Recipient's slot in `names`.
        player_index: u8,
        /// Both players' names.
        names: [String; 2],
    },
}

impl NetworkMessage {
    /// Decode a message: one tag byte, then the variant's fields.
    pub fn create(de: &mut Deserializer<'_>) -> Result<Self, WireError> {
        let raw = de.read_u8()?;
        let tag = MessageTag::from_u8(raw).ok_or(WireError::UnknownMessageType(raw))?;

        let message = match tag {
            MessageTag::Login => Self::Login {
                name: de.read_string()?,
            },
            MessageTag::InputChanged => Self::InputChanged {
                payload: de.read_remaining().to_vec(),
            },
            MessageTag::ScoreUpdate => Self::ScoreUpdate {
                name: de.read_string()?,
                score: de.read_u32()?,
            },
            MessageTag::LeaderboardUpdate => Self::LeaderboardUpdate {
                name: de.read_string()?,
                score: de.read_u32()?,
                removed_name: de.read_string()?,
            },
            MessageTag::SessionStart => {
                let player_index = de.read_u8()?;
                let first = de.read_string()?;
                let second = de.read_string()?;
                Self::SessionStart {
                    player_index,
                    names: [first, second],
                }
            }
        };

        Ok(message)
    }

    /// Encode this message, tag first.
    pub fn serialize(&self, ser: &mut Serializer) -> Result<(), WireError> {
        ser.write_u8(self.tag() as u8);

        match self {
            Self::Login { name } => {
                ser.write_string(name)?;
            }
            Self::InputChanged { payload } => {
                ser.write_bytes(payload);
            }
            Self::ScoreUpdate { name, score } => {
                ser.write_string(name)?;
                ser.write_u32(*score);
            }
            Self::LeaderboardUpdate { name, score, removed_name } => {
                ser.write_string(name)?;
                ser.write_u32(*score);
                ser.write_string(removed_name)?;
            }
            Self::SessionStart { player_index, names } => {
                ser.write_u8(*player_index);
                ser.write_string(&names[0])?;
                ser.write_string(&names[1])?;
            }
        }

        Ok(())
    }

    /// Tag byte for this message.
    pub fn tag(&self) -> MessageTag {
        match self {
            Self::Login { .. } => MessageTag::Login,
            Self::InputChanged { .. } => MessageTag::InputChanged,
            Self::ScoreUpdate { .. } => MessageTag::ScoreUpdate,
            Self::LeaderboardUpdate { .. } => MessageTag::LeaderboardUpdate,
            Self::SessionStart { .. } => MessageTag::SessionStart,
        }
    }

    /// Decode a whole frame.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WireError> {
        Self::create(&mut Deserializer::new(data))
    }

    /// Encode into a fresh frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut ser = Serializer::with_capacity(32);
        self.serialize(&mut ser)?;
        Ok(ser.into_bytes())
    }
}
