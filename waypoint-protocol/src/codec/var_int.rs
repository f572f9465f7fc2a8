use std::{io, num::NonZeroUsize, ops::Deref};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Codec;
use crate::ser::{NetworkReadExt, NetworkWriteExt, ReadingError, WritingError};

pub type VarIntType = i32;

/// A variable-length integer type used by the Minecraft network protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarInt(pub VarIntType);

impl Codec<Self> for VarInt {
    /// The maximum number of bytes a `VarInt` can occupy.
    const MAX_SIZE: NonZeroUsize = NonZeroUsize::new(5).unwrap();

    /// Returns the exact number of bytes this varint will write when
    /// [`Codec::encode`] is called, assuming no error occurs.
    fn written_size(&self) -> usize {
        match self.0 {
            0 => 1,
            n => (31 - n.leading_zeros() as usize) / 7 + 1,
        }
    }

    fn encode(&self, write: &mut impl io::Write) -> Result<(), WritingError> {
        let mut val = self.0;
        for _ in 0..Self::MAX_SIZE.get() {
            let b: u8 = val as u8 & 0b0111_1111;
            val = ((val as u32) >> 7) as i32;
            write.write_u8_be(if val == 0 { b } else { b | 0b1000_0000 })?;
            if val == 0 {
                break;
            }
        }
        Ok(())
    }

    fn decode(read: &mut impl io::Read) -> Result<Self, ReadingError> {
        let mut val = 0;
        for i in 0..Self::MAX_SIZE.get() {
            let byte = match read.get_u8_be() {
                Ok(byte) => byte,
                // EOF before the first byte means the stream ended between
                // packets rather than inside one
                Err(err) if i == 0 => {
                    return Err(ReadingError::CleanEOF(err.to_string()));
                }
                Err(err) => return Err(err),
            };
            val |= (i32::from(byte) & 0x7F) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(Self(val));
            }
        }
        Err(ReadingError::TooLarge("VarInt".to_string()))
    }
}

impl VarInt {
    pub async fn encode_async(
        &self,
        write: &mut (impl AsyncWrite + Unpin),
    ) -> Result<(), WritingError> {
        let mut val = self.0;
        for _ in 0..Self::MAX_SIZE.get() {
            let b: u8 = val as u8 & 0b0111_1111;
            val = ((val as u32) >> 7) as i32;
            write
                .write_u8(if val == 0 { b } else { b | 0b1000_0000 })
                .await
                .map_err(WritingError::IoError)?;
            if val == 0 {
                break;
            }
        }
        Ok(())
    }

    pub async fn decode_async(
        read: &mut (impl AsyncRead + Unpin),
    ) -> Result<Self, ReadingError> {
        let mut val = 0;
        for i in 0..Self::MAX_SIZE.get() {
            let byte = match read.read_u8().await {
                Ok(byte) => byte,
                Err(err) if i == 0 && err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(ReadingError::CleanEOF("VarInt".to_string()));
                }
                Err(err) => return Err(ReadingError::Incomplete(err.to_string())),
            };
            val |= (i32::from(byte) & 0x7F) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(Self(val));
            }
        }
        Err(ReadingError::TooLarge("VarInt".to_string()))
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        VarInt(value)
    }
}

impl From<u32> for VarInt {
    fn from(value: u32) -> Self {
        VarInt(value as i32)
    }
}

impl From<u8> for VarInt {
    fn from(value: u8) -> Self {
        VarInt(i32::from(value))
    }
}

impl From<usize> for VarInt {
    fn from(value: usize) -> Self {
        VarInt(value as i32)
    }
}

impl From<VarInt> for i32 {
    fn from(value: VarInt) -> Self {
        value.0
    }
}

impl AsRef<i32> for VarInt {
    fn as_ref(&self) -> &i32 {
        &self.0
    }
}

impl Deref for VarInt {
    type Target = i32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_written_size_matches_encoding() {
        for value in [0, 1, 127, 128, 255, 16383, 16384, 2097151, i32::MAX, -1, i32::MIN] {
            let var_int = VarInt(value);
            let mut buf = Vec::new();
            var_int.encode(&mut buf).unwrap();
            assert_eq!(buf.len(), var_int.written_size(), "value {value}");
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        for value in [0, 1, -1, 300, -300, i32::MAX, i32::MIN] {
            let mut buf = Vec::new();
            VarInt(value).encode(&mut buf).unwrap();
            let decoded = VarInt::decode(&mut buf.as_slice()).unwrap();
            assert_eq!(decoded.0, value);
        }
    }

    #[test]
    fn test_decode_rejects_overlong() {
        let mut bytes: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            VarInt::decode(&mut bytes),
            Err(ReadingError::TooLarge(_))
        ));
    }

    #[test]
    fn test_decode_empty_is_clean_eof() {
        let mut bytes: &[u8] = &[];
        assert!(matches!(
            VarInt::decode(&mut bytes),
            Err(ReadingError::CleanEOF(_))
        ));
    }
}
