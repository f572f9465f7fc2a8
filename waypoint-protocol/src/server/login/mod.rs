use std::io::Read;

use uuid::Uuid;

use crate::{
    ServerPacket,
    packet_id::serverbound::LOGIN_HELLO,
    ser::{NetworkReadExt, ReadingError, packet::Packet},
};

pub struct SLoginStart {
    pub name: String, // 16
    pub uuid: Uuid,
}

impl Packet for SLoginStart {
    const PACKET_ID: i32 = LOGIN_HELLO;
}

impl ServerPacket for SLoginStart {
    fn read(read: impl Read) -> Result<Self, ReadingError> {
        let mut read = read;
        Ok(Self {
            name: read.get_string_bounded(16)?,
            uuid: read.get_uuid()?,
        })
    }
}
