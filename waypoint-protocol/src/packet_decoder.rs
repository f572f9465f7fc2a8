use async_compression::tokio::bufread::ZlibDecoder;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::{
    CompressionThreshold, MAX_PACKET_DATA_SIZE, MAX_PACKET_SIZE, RawPacket, VarInt,
    codec::Codec,
    ser::ReadingError,
};

// framed -> decompress -> raw
pub enum DecompressionReader<R: AsyncRead + Unpin> {
    Decompress(ZlibDecoder<BufReader<R>>),
    None(R),
}

impl<R: AsyncRead + Unpin> AsyncRead for DecompressionReader<R> {
    #[inline]
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Decompress(reader) => {
                let reader = std::pin::Pin::new(reader);
                reader.poll_read(cx, buf)
            }
            Self::None(reader) => {
                let reader = std::pin::Pin::new(reader);
                reader.poll_read(cx, buf)
            }
        }
    }
}

/// Decoder: Client -> Proxy
/// Supports ZLib decompression
pub struct NetworkDecoder<R: AsyncRead + Unpin> {
    reader: R,
    compression: Option<CompressionThreshold>,
}

impl<R: AsyncRead + Unpin> NetworkDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            compression: None,
        }
    }

    pub fn set_compression(&mut self, threshold: CompressionThreshold) {
        self.compression = Some(threshold);
    }

    pub async fn get_raw_packet(&mut self) -> Result<RawPacket, PacketDecodeError> {
        let packet_len = VarInt::decode_async(&mut self.reader)
            .await
            .map_err(|err| match err {
                ReadingError::CleanEOF(_) => PacketDecodeError::ConnectionClosed,
                err => PacketDecodeError::MalformedLength(err.to_string()),
            })?;

        let packet_len = packet_len.0 as u64;

        if !(0..=MAX_PACKET_SIZE).contains(&packet_len) {
            Err(PacketDecodeError::OutOfBounds)?
        }

        let mut bounded_reader = (&mut self.reader).take(packet_len);

        let mut reader = if let Some(threshold) = self.compression {
            let decompressed_length = VarInt::decode_async(&mut bounded_reader).await?;
            let raw_packet_length = packet_len as usize - decompressed_length.written_size();
            let decompressed_length = decompressed_length.0 as usize;

            if !(0..=MAX_PACKET_DATA_SIZE).contains(&decompressed_length) {
                Err(PacketDecodeError::TooLong)?
            }

            if decompressed_length > 0 {
                DecompressionReader::Decompress(ZlibDecoder::new(BufReader::new(bounded_reader)))
            } else {
                // Validate that we are not less than the compression threshold
                if raw_packet_length > threshold {
                    Err(PacketDecodeError::NotCompressed)?
                }

                DecompressionReader::None(bounded_reader)
            }
        } else {
            DecompressionReader::None(bounded_reader)
        };

        let packet_id = VarInt::decode_async(&mut reader)
            .await
            .map_err(|_| PacketDecodeError::DecodeID)?
            .0;

        let mut payload = Vec::new();
        reader
            .read_to_end(&mut payload)
            .await
            .map_err(|err| PacketDecodeError::FailedDecompression(err.to_string()))?;

        Ok(RawPacket {
            id: packet_id,
            payload: payload.into(),
        })
    }
}

#[derive(Error, Debug)]
pub enum PacketDecodeError {
    #[error("failed to decode packet ID")]
    DecodeID,
    #[error("packet exceeds maximum length")]
    TooLong,
    #[error("packet length is out of bounds")]
    OutOfBounds,
    #[error("malformed packet length VarInt: {0}")]
    MalformedLength(String),
    #[error("failed to decompress packet: {0}")]
    FailedDecompression(String),
    #[error("packet is uncompressed but greater than the threshold")]
    NotCompressed,
    #[error("the connection has closed")]
    ConnectionClosed,
}

impl From<ReadingError> for PacketDecodeError {
    fn from(value: ReadingError) -> Self {
        Self::FailedDecompression(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::ser::NetworkWriteExt;

    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    /// Helper function to compress data with zlib
    fn compress_zlib(data: &[u8]) -> Vec<u8> {
        let mut compressed = Vec::new();
        let mut encoder = ZlibEncoder::new(&mut compressed, Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap();
        compressed
    }

    /// Helper function to build a frame with optional compression
    fn build_packet(packet_id: i32, payload: &[u8], compress: bool) -> Vec<u8> {
        let mut buffer = Vec::new();

        if compress {
            // The compressed body covers the packet id and the payload
            let mut data_to_compress = Vec::new();
            let packet_id_varint = VarInt(packet_id);
            data_to_compress.write_var_int(&packet_id_varint).unwrap();
            data_to_compress.write_slice(payload).unwrap();

            let compressed_payload = compress_zlib(&data_to_compress);
            let data_len = data_to_compress.len() as i32;
            let data_len_varint = VarInt(data_len);
            buffer.write_var_int(&data_len_varint).unwrap();
            buffer.write_slice(&compressed_payload).unwrap();
        } else {
            let packet_id_varint = VarInt(packet_id);
            buffer.write_var_int(&packet_id_varint).unwrap();
            buffer.write_slice(payload).unwrap();
        }

        let packet_len = buffer.len() as i32;
        let packet_len_varint = VarInt(packet_len);

        let mut packet = Vec::new();
        packet.write_var_int(&packet_len_varint).unwrap();
        packet.extend_from_slice(&buffer);
        packet
    }

    #[tokio::test]
    async fn test_decode_without_compression() {
        let packet_id = 1;
        let payload = b"Hello";

        let packet = build_packet(packet_id, payload, false);

        let mut decoder = NetworkDecoder::new(packet.as_slice());

        let raw_packet = decoder.get_raw_packet().await.expect("Decoding failed");

        assert_eq!(raw_packet.id, packet_id);
        assert_eq!(raw_packet.payload.as_ref(), payload);
    }

    #[tokio::test]
    async fn test_decode_with_compression() {
        let packet_id = 2;
        let payload = b"Hello, compressed world!";

        let packet = build_packet(packet_id, payload, true);

        let mut decoder = NetworkDecoder::new(packet.as_slice());
        // Larger than payload
        decoder.set_compression(1000);

        let raw_packet = decoder.get_raw_packet().await.expect("Decoding failed");

        assert_eq!(raw_packet.id, packet_id);
        assert_eq!(raw_packet.payload.as_ref(), payload);
    }

    #[tokio::test]
    async fn test_decode_with_invalid_compressed_data() {
        let data_len = 10; // Expected decompressed size
        let invalid_compressed_data = vec![0xFF, 0xFF, 0xFF]; // Invalid Zlib data

        let mut buffer = Vec::new();
        let data_len_varint = VarInt(data_len);
        buffer.write_var_int(&data_len_varint).unwrap();
        buffer.write_slice(&invalid_compressed_data).unwrap();

        let packet_len = buffer.len() as i32;
        let packet_len_varint = VarInt(packet_len);

        let mut packet_buffer = Vec::new();
        packet_buffer.write_var_int(&packet_len_varint).unwrap();
        packet_buffer.write_slice(&buffer).unwrap();

        let mut decoder = NetworkDecoder::new(packet_buffer.as_slice());
        decoder.set_compression(1000);

        let result = decoder.get_raw_packet().await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_decode_with_zero_length_payload() {
        let packet_id = 7;
        let payload = b"";

        let packet = build_packet(packet_id, payload, false);

        let mut decoder = NetworkDecoder::new(packet.as_slice());

        let raw_packet = decoder.get_raw_packet().await.unwrap();
        assert_eq!(raw_packet.id, packet_id);
        assert_eq!(raw_packet.payload.as_ref(), payload);
    }

    #[tokio::test]
    async fn test_decode_at_clean_eof_reports_closed() {
        let mut decoder = NetworkDecoder::new(&[][..]);

        let result = decoder.get_raw_packet().await;
        assert!(matches!(result, Err(PacketDecodeError::ConnectionClosed)));
    }
}
