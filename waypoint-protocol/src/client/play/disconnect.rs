use std::io::Write;

use waypoint_util::text::TextComponent;

use crate::{
    ClientPacket,
    packet_id::clientbound::PLAY_DISCONNECT,
    ser::{NetworkWriteExt, WritingError, packet::Packet},
};

pub struct CPlayDisconnect {
    pub reason: TextComponent,
}

impl CPlayDisconnect {
    pub fn new(reason: TextComponent) -> Self {
        Self { reason }
    }
}

impl Packet for CPlayDisconnect {
    const PACKET_ID: i32 = PLAY_DISCONNECT;
}

impl ClientPacket for CPlayDisconnect {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        let json = serde_json::to_string(&self.reason)
            .map_err(|err| WritingError::Serde(err.to_string()))?;
        write.write_string(&json)
    }
}
