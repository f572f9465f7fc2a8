use crate::codec::var_int::VarIntType;

pub trait Packet {
    const PACKET_ID: VarIntType;
}
