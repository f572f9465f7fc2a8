//! Packet ids for protocol 769 (Minecraft 1.21.4). Only the packets the proxy
//! itself speaks are listed; everything else passes through untouched.

pub mod clientbound {
    pub const STATUS_STATUS_RESPONSE: i32 = 0x00;
    pub const STATUS_PONG_RESPONSE: i32 = 0x01;

    pub const LOGIN_LOGIN_DISCONNECT: i32 = 0x00;

    pub const PLAY_DISCONNECT: i32 = 0x1D;
    pub const PLAY_PLAYER_INFO_REMOVE: i32 = 0x3F;
    pub const PLAY_PLAYER_INFO_UPDATE: i32 = 0x40;
    pub const PLAY_TAB_LIST: i32 = 0x6D;
}

pub mod serverbound {
    pub const HANDSHAKE_INTENTION: i32 = 0x00;

    pub const STATUS_STATUS_REQUEST: i32 = 0x00;
    pub const STATUS_PING_REQUEST: i32 = 0x01;

    pub const LOGIN_HELLO: i32 = 0x00;
}
