use std::io::Read;

use crate::{
    ServerPacket,
    packet_id::serverbound::{STATUS_PING_REQUEST, STATUS_STATUS_REQUEST},
    ser::{NetworkReadExt, ReadingError, packet::Packet},
};

pub struct SStatusRequest;

impl Packet for SStatusRequest {
    const PACKET_ID: i32 = STATUS_STATUS_REQUEST;
}

pub struct SStatusPingRequest {
    pub payload: i64,
}

impl Packet for SStatusPingRequest {
    const PACKET_ID: i32 = STATUS_PING_REQUEST;
}

impl ServerPacket for SStatusPingRequest {
    fn read(read: impl Read) -> Result<Self, ReadingError> {
        let mut read = read;
        Ok(Self {
            payload: read.get_i64_be()?,
        })
    }
}
