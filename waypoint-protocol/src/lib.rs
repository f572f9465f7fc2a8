use std::io::{Read, Write};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use ser::{NetworkWriteExt, ReadingError, WritingError, packet::Packet};
use uuid::Uuid;

pub use codec::var_int::VarInt;

pub mod client;
pub mod codec;
pub mod packet_decoder;
pub mod packet_encoder;
pub mod packet_id;
pub mod ser;
pub mod server;

pub const MAX_PACKET_SIZE: u64 = 2097152;
pub const MAX_PACKET_DATA_SIZE: usize = 8388608;

/// The Minecraft version the packet id tables in [`packet_id`] target.
pub const CURRENT_MC_VERSION: &str = "1.21.4";

/// Represents a compression threshold.
///
/// The threshold determines the minimum size of data that should be compressed.
/// Data smaller than the threshold will not be compressed.
pub type CompressionThreshold = usize;

/// Represents a compression level.
///
/// The level controls the amount of compression applied to the data.
/// Higher levels generally result in higher compression ratios, but also
/// increase CPU usage.
pub type CompressionLevel = u32;

/// A Minecraft wire protocol revision. Revisions increase monotonically, so
/// feature gates read as plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub i32);

impl ProtocolVersion {
    pub const MINECRAFT_1_19_3: Self = Self(761);
    pub const MINECRAFT_1_20_4: Self = Self(765);
    pub const MINECRAFT_1_21: Self = Self(767);
    /// Introduced the `UPDATE_LIST_ORDER` player-info action.
    pub const MINECRAFT_1_21_2: Self = Self(768);
    pub const MINECRAFT_1_21_4: Self = Self(769);

    /// The newest revision the proxy speaks.
    pub const CURRENT: Self = Self::MINECRAFT_1_21_4;
    /// The oldest revision the proxy speaks.
    pub const OLDEST_SUPPORTED: Self = Self::MINECRAFT_1_19_3;

    pub fn is_supported(self) -> bool {
        (Self::OLDEST_SUPPORTED..=Self::CURRENT).contains(&self)
    }
}

impl From<i32> for ProtocolVersion {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ConnectionState {
    HandShake,
    Status,
    Login,
    Transfer,
    Config,
    Play,
}

pub struct InvalidConnectionState;

impl TryFrom<VarInt> for ConnectionState {
    type Error = InvalidConnectionState;

    fn try_from(value: VarInt) -> Result<Self, Self::Error> {
        let value = value.0;
        match value {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            3 => Ok(Self::Transfer),
            _ => Err(InvalidConnectionState),
        }
    }
}

pub struct RawPacket {
    pub id: i32,
    pub payload: Bytes,
}

pub trait ClientPacket: Packet {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError>;

    fn write(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        write.write_var_int(&VarInt(Self::PACKET_ID))?;
        self.write_packet_data(write)
    }
}

pub trait ServerPacket: Packet + Sized {
    fn read(read: impl Read) -> Result<Self, ReadingError>;
}

#[derive(Serialize)]
pub struct StatusResponse {
    /// The version on which the server is running. (Optional)
    pub version: Option<Version>,
    /// Information about currently connected players. (Optional)
    pub players: Option<Players>,
    /// The description displayed, also called MOTD (Message of the Day). (Optional)
    pub description: String,
    /// The icon displayed. (Optional)
    pub favicon: Option<String>,
    /// Whether players are forced to use secure chat.
    pub enforce_secure_chat: bool,
}

#[derive(Serialize)]
pub struct Version {
    /// The name of the version (e.g. 1.21.4)
    pub name: String,
    /// The protocol version (e.g. 769)
    pub protocol: u32,
}

#[derive(Serialize)]
pub struct Players {
    /// The maximum player count that the server allows.
    pub max: u32,
    /// The current online player count.
    pub online: u32,
    /// Information about currently connected players.
    /// Note: players can disable listing here.
    pub sample: Vec<Sample>,
}

#[derive(Serialize)]
pub struct Sample {
    /// The player's name.
    pub name: String,
    /// The player's UUID.
    pub id: String,
}

// basically game profile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    // base 64
    pub value: String,
    // base 64
    pub signature: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GameProfile {
    pub id: Uuid,
    pub name: String,
    pub properties: Vec<Property>,
}

/// Chain-of-trust token for signed chat, forwarded to clients so they can
/// verify each other's messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteChatSession {
    pub session_id: Uuid,
    /// Unix epoch milliseconds at which the key expires.
    pub expires_at: i64,
    pub public_key: Box<[u8]>,
    pub key_signature: Box<[u8]>,
}
