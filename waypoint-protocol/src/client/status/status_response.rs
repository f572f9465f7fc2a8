use std::io::Write;

use crate::{
    ClientPacket,
    packet_id::clientbound::STATUS_STATUS_RESPONSE,
    ser::{NetworkWriteExt, WritingError, packet::Packet},
};

pub struct CStatusResponse<'a> {
    // 32767
    pub json_response: &'a str,
}

impl<'a> CStatusResponse<'a> {
    pub fn new(json_response: &'a str) -> Self {
        Self { json_response }
    }
}

impl Packet for CStatusResponse<'_> {
    const PACKET_ID: i32 = STATUS_STATUS_RESPONSE;
}

impl ClientPacket for CStatusResponse<'_> {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        write.write_string(self.json_response)
    }
}
