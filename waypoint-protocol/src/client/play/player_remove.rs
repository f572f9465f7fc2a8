use std::io::{Read, Write};

use uuid::Uuid;

use crate::{
    ClientPacket, ServerPacket,
    packet_id::clientbound::PLAY_PLAYER_INFO_REMOVE,
    ser::{NetworkReadExt, NetworkWriteExt, ReadingError, WritingError, packet::Packet},
};

pub struct CRemovePlayerInfo {
    pub profiles_to_remove: Vec<Uuid>,
}

impl CRemovePlayerInfo {
    pub fn new(profiles_to_remove: Vec<Uuid>) -> Self {
        Self { profiles_to_remove }
    }
}

impl Packet for CRemovePlayerInfo {
    const PACKET_ID: i32 = PLAY_PLAYER_INFO_REMOVE;
}

impl ClientPacket for CRemovePlayerInfo {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        write.write_list::<Uuid>(&self.profiles_to_remove, |w, uuid| w.write_uuid(uuid))
    }
}

impl ServerPacket for CRemovePlayerInfo {
    fn read(read: impl Read) -> Result<Self, ReadingError> {
        let mut read = read;
        let profiles_to_remove = read.get_list(NetworkReadExt::get_uuid)?;
        Ok(Self { profiles_to_remove })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let packet = CRemovePlayerInfo::new(vec![Uuid::new_v4(), Uuid::new_v4()]);

        let mut buf = Vec::new();
        packet.write_packet_data(&mut buf).unwrap();
        let decoded = CRemovePlayerInfo::read(buf.as_slice()).unwrap();

        assert_eq!(decoded.profiles_to_remove, packet.profiles_to_remove);
    }
}
