use std::io::Write;

use crate::{
    ClientPacket,
    packet_id::clientbound::LOGIN_LOGIN_DISCONNECT,
    ser::{NetworkWriteExt, WritingError, packet::Packet},
};

pub struct CLoginDisconnect<'a> {
    // Unlike the play-state disconnect, the reason here is a JSON string
    pub json_reason: &'a str,
}

impl<'a> CLoginDisconnect<'a> {
    pub fn new(json_reason: &'a str) -> Self {
        Self { json_reason }
    }
}

impl Packet for CLoginDisconnect<'_> {
    const PACKET_ID: i32 = LOGIN_LOGIN_DISCONNECT;
}

impl ClientPacket for CLoginDisconnect<'_> {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        write.write_string(self.json_reason)
    }
}
