use std::io::Write;

use waypoint_util::text::TextComponent;

use crate::{
    ClientPacket,
    packet_id::clientbound::PLAY_TAB_LIST,
    ser::{NetworkWriteExt, WritingError, packet::Packet},
};

/// Sets the text shown above and below the player list.
pub struct CPlayerListHeader {
    pub header: TextComponent,
    pub footer: TextComponent,
}

impl CPlayerListHeader {
    pub fn new(header: TextComponent, footer: TextComponent) -> Self {
        Self { header, footer }
    }
}

impl Packet for CPlayerListHeader {
    const PACKET_ID: i32 = PLAY_TAB_LIST;
}

impl ClientPacket for CPlayerListHeader {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        for component in [&self.header, &self.footer] {
            let json = serde_json::to_string(component)
                .map_err(|err| WritingError::Serde(err.to_string()))?;
            write.write_string(&json)?;
        }
        Ok(())
    }
}
