use std::io::Read;

use crate::{
    ConnectionState, ServerPacket, VarInt,
    packet_id::serverbound::HANDSHAKE_INTENTION,
    ser::{NetworkReadExt, ReadingError, packet::Packet},
};

pub struct SHandShake {
    pub protocol_version: VarInt,
    pub server_address: String, // 255
    pub server_port: u16,
    pub next_state: ConnectionState,
}

impl Packet for SHandShake {
    const PACKET_ID: i32 = HANDSHAKE_INTENTION;
}

impl ServerPacket for SHandShake {
    fn read(read: impl Read) -> Result<Self, ReadingError> {
        let mut read = read;
        Ok(Self {
            protocol_version: read.get_var_int()?,
            server_address: read.get_string_bounded(255)?,
            server_port: read.get_u16_be()?,
            next_state: read
                .get_var_int()?
                .try_into()
                .map_err(|_| ReadingError::Message("Invalid Status".to_string()))?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ser::NetworkWriteExt;

    #[test]
    fn test_read_handshake() {
        let mut buf = Vec::new();
        buf.write_var_int(&VarInt(769)).unwrap();
        buf.write_string("play.example.com").unwrap();
        buf.write_u16_be(25565).unwrap();
        buf.write_var_int(&VarInt(2)).unwrap();

        let handshake = SHandShake::read(buf.as_slice()).unwrap();
        assert_eq!(handshake.protocol_version.0, 769);
        assert_eq!(handshake.server_address, "play.example.com");
        assert_eq!(handshake.server_port, 25565);
        assert_eq!(handshake.next_state, ConnectionState::Login);
    }

    #[test]
    fn test_rejects_unknown_state() {
        let mut buf = Vec::new();
        buf.write_var_int(&VarInt(769)).unwrap();
        buf.write_string("play.example.com").unwrap();
        buf.write_u16_be(25565).unwrap();
        buf.write_var_int(&VarInt(9)).unwrap();

        assert!(SHandShake::read(buf.as_slice()).is_err());
    }
}
