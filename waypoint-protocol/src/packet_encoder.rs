use async_compression::{Level, tokio::write::ZlibEncoder};
use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    CompressionLevel, CompressionThreshold, MAX_PACKET_DATA_SIZE, MAX_PACKET_SIZE, VarInt,
    codec::Codec,
};

/// Encoder: Proxy -> Client
/// Supports ZLib compression
///
/// If compression is enabled and the packet size exceeds the threshold, the
/// packet is compressed. The packet is prefixed with its length and, if
/// compression is enabled, the uncompressed data length (`0` marks an
/// uncompressed packet).
pub struct NetworkEncoder<W: AsyncWrite + Unpin> {
    writer: W,
    // compression threshold and compression level
    compression: Option<(CompressionThreshold, CompressionLevel)>,
}

impl<W: AsyncWrite + Unpin> NetworkEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            compression: None,
        }
    }

    pub fn set_compression(&mut self, compression_info: (CompressionThreshold, CompressionLevel)) {
        self.compression = Some(compression_info);
    }

    /// Writes one serialized packet (id + data, no length prefix) as a frame.
    pub async fn write_packet(&mut self, packet_data: Bytes) -> Result<(), PacketEncodeError> {
        let data_len = packet_data.len();
        if data_len > MAX_PACKET_DATA_SIZE {
            return Err(PacketEncodeError::TooLong(data_len));
        }
        let data_len_var_int: VarInt = data_len.into();

        if let Some((compression_threshold, compression_level)) = self.compression {
            if data_len >= compression_threshold {
                // We need the compressed length at the beginning of the frame,
                // so the compressor has to run into a buffer first
                let mut compressed_buf = Vec::new();
                let mut compressor = ZlibEncoder::with_quality(
                    &mut compressed_buf,
                    Level::Precise(compression_level as i32),
                );

                compressor
                    .write_all(&packet_data)
                    .await
                    .map_err(|err| PacketEncodeError::CompressionFailed(err.to_string()))?;
                compressor
                    .shutdown()
                    .await
                    .map_err(|err| PacketEncodeError::CompressionFailed(err.to_string()))?;
                debug_assert!(!compressed_buf.is_empty());

                let full_packet_len_var_int: VarInt =
                    (data_len_var_int.written_size() + compressed_buf.len()).into();

                let complete_serialization_length =
                    full_packet_len_var_int.written_size() + full_packet_len_var_int.0 as usize;
                if complete_serialization_length > MAX_PACKET_SIZE as usize {
                    return Err(PacketEncodeError::TooLong(complete_serialization_length));
                }

                full_packet_len_var_int
                    .encode_async(&mut self.writer)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
                data_len_var_int
                    .encode_async(&mut self.writer)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
                self.writer
                    .write_all(&compressed_buf)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
            } else {
                // A data length of 0 marks the packet as uncompressed
                let data_len_var_int: VarInt = 0.into();
                let full_packet_len_var_int: VarInt =
                    (data_len_var_int.written_size() + data_len).into();

                let complete_serialization_length =
                    full_packet_len_var_int.written_size() + full_packet_len_var_int.0 as usize;
                if complete_serialization_length > MAX_PACKET_SIZE as usize {
                    return Err(PacketEncodeError::TooLong(complete_serialization_length));
                }

                full_packet_len_var_int
                    .encode_async(&mut self.writer)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
                data_len_var_int
                    .encode_async(&mut self.writer)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
                self.writer
                    .write_all(&packet_data)
                    .await
                    .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
            }
        } else {
            let full_packet_len_var_int: VarInt = data_len_var_int;

            let complete_serialization_length =
                full_packet_len_var_int.written_size() + full_packet_len_var_int.0 as usize;
            if complete_serialization_length > MAX_PACKET_SIZE as usize {
                return Err(PacketEncodeError::TooLong(complete_serialization_length));
            }

            full_packet_len_var_int
                .encode_async(&mut self.writer)
                .await
                .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
            self.writer
                .write_all(&packet_data)
                .await
                .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
        }

        self.writer
            .flush()
            .await
            .map_err(|err| PacketEncodeError::Message(err.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur during packet encoding.
#[derive(Error, Debug)]
pub enum PacketEncodeError {
    #[error("Packet exceeds maximum length: {0}")]
    TooLong(usize),
    #[error("Compression failed {0}")]
    CompressionFailed(String),
    #[error("Writing packet failed: {0}")]
    Message(String),
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::ClientPacket;
    use crate::client::status::CStatusResponse;
    use crate::ser::packet::Packet;
    use crate::ser::{NetworkReadExt, ReadingError};
    use flate2::read::ZlibDecoder;

    /// Helper function to decode a `VarInt` from bytes
    fn decode_varint(buffer: &mut &[u8]) -> Result<i32, ReadingError> {
        Ok(buffer.get_var_int()?.0)
    }

    /// Helper function to decompress zlib data
    fn decompress_zlib(data: &[u8], expected_size: usize) -> Result<Vec<u8>, std::io::Error> {
        assert!(!data.is_empty());
        let mut decompressed = vec![0u8; expected_size];
        ZlibDecoder::new(data).read_exact(&mut decompressed)?;
        Ok(decompressed)
    }

    /// Helper function to build a frame with optional compression
    async fn build_packet_with_encoder<T: ClientPacket>(
        packet: &T,
        compression_info: Option<(CompressionThreshold, CompressionLevel)>,
    ) -> Box<[u8]> {
        let mut buf = Vec::new();
        let mut encoder = NetworkEncoder::new(&mut buf);
        if let Some(compression_info) = compression_info {
            encoder.set_compression(compression_info);
        }

        let mut packet_buf = Vec::new();
        packet.write(&mut packet_buf).unwrap();
        encoder.write_packet(packet_buf.into()).await.unwrap();

        buf.into_boxed_slice()
    }

    #[tokio::test]
    async fn test_encode_without_compression() {
        let packet = CStatusResponse::new("{\"description\": \"A Minecraft Proxy\"}");

        let packet_bytes = build_packet_with_encoder(&packet, None).await;

        let mut buffer = &packet_bytes[..];

        let packet_length = decode_varint(&mut buffer).expect("Failed to decode packet length");
        assert_eq!(
            packet_length as usize,
            buffer.len(),
            "Packet length mismatch"
        );

        let decoded_packet_id = decode_varint(&mut buffer).expect("Failed to decode packet ID");
        assert_eq!(decoded_packet_id, CStatusResponse::PACKET_ID);

        let mut expected_payload = Vec::new();
        packet.write_packet_data(&mut expected_payload).unwrap();

        assert_eq!(buffer, expected_payload);
    }

    #[tokio::test]
    async fn test_encode_with_compression() {
        let packet = CStatusResponse::new("{\"description\": \"A Minecraft Proxy\"}");

        // Threshold 0 forces compression
        let packet_bytes = build_packet_with_encoder(&packet, Some((0, 6))).await;

        let mut buffer = &packet_bytes[..];

        let packet_length = decode_varint(&mut buffer).expect("Failed to decode packet length");
        assert_eq!(
            packet_length as usize,
            buffer.len(),
            "Packet length mismatch"
        );

        let data_length = decode_varint(&mut buffer).expect("Failed to decode data length");
        let mut expected_payload = Vec::new();
        packet.write_packet_data(&mut expected_payload).unwrap();
        let uncompressed_data_length =
            VarInt(CStatusResponse::PACKET_ID).written_size() + expected_payload.len();
        assert_eq!(data_length as usize, uncompressed_data_length);

        let decompressed_data =
            decompress_zlib(buffer, data_length as usize).expect("Failed to decompress data");

        let mut decompressed_buffer = &decompressed_data[..];

        let decoded_packet_id =
            decode_varint(&mut decompressed_buffer).expect("Failed to decode packet ID");
        assert_eq!(decoded_packet_id, CStatusResponse::PACKET_ID);

        assert_eq!(decompressed_buffer, expected_payload);
    }

    #[tokio::test]
    async fn test_encode_small_payload_no_compression() {
        let packet = CStatusResponse::new("Hi");

        // Threshold larger than the payload leaves it uncompressed
        let packet_bytes = build_packet_with_encoder(&packet, Some((10, 6))).await;

        let mut buffer = &packet_bytes[..];

        let packet_length = decode_varint(&mut buffer).expect("Failed to decode packet length");
        assert_eq!(
            packet_length as usize,
            buffer.len(),
            "Packet length mismatch"
        );

        let data_length = decode_varint(&mut buffer).expect("Failed to decode data length");
        assert_eq!(
            data_length, 0,
            "Data length should be 0 indicating no compression"
        );

        let decoded_packet_id = decode_varint(&mut buffer).expect("Failed to decode packet ID");
        assert_eq!(decoded_packet_id, CStatusResponse::PACKET_ID);

        let mut expected_payload = Vec::new();
        packet.write_packet_data(&mut expected_payload).unwrap();

        assert_eq!(buffer, expected_payload);
    }

    #[tokio::test]
    async fn test_encode_packet_exceeding_maximum_size() {
        let oversized = Bytes::from(vec![0xAB; MAX_PACKET_DATA_SIZE + 1]);

        let mut buf = Vec::new();
        let mut encoder = NetworkEncoder::new(&mut buf);
        let result = encoder.write_packet(oversized).await;

        assert!(matches!(result, Err(PacketEncodeError::TooLong(_))));
    }
}
