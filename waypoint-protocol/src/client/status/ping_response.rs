use std::io::Write;

use crate::{
    ClientPacket,
    packet_id::clientbound::STATUS_PONG_RESPONSE,
    ser::{NetworkWriteExt, WritingError, packet::Packet},
};

pub struct CPingResponse {
    pub payload: i64, // must respond with the same as in `SPingRequest`
}

impl CPingResponse {
    pub fn new(payload: i64) -> Self {
        Self { payload }
    }
}

impl Packet for CPingResponse {
    const PACKET_ID: i32 = STATUS_PONG_RESPONSE;
}

impl ClientPacket for CPingResponse {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        write.write_i64_be(self.payload)
    }
}
