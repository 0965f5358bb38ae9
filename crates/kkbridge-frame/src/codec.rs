use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, HeaderFault, Result};

/// Size of one transport report on the wire.
pub const FRAME_SIZE: usize = 64;

/// Message bytes carried by one report (everything but the report id).
pub const SEGMENT_SIZE: usize = FRAME_SIZE - 1;

/// Leading byte of every report: `?`.
pub const REPORT_ID: u8 = 0x3f;

/// Message preamble: `##`.
pub const MAGIC: [u8; 2] = [0x23, 0x23];

/// Message header: magic (2) + type (2) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum declared payload accepted from the device: 2 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 2 * 1024 * 1024;

/// The decoded header of a logical message.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────────┬──────────────────┐
/// │ Magic (2B)   │ Type      │ Length       │ Payload          │
/// │ 0x23 0x23    │ (2B BE)   │ (4B BE)      │ (Length bytes)   │
/// │ "##"         │           │              │                  │
/// └──────────────┴───────────┴──────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Protobuf message type id.
    pub msg_type: u16,
    /// Number of payload bytes following the header.
    pub payload_len: u32,
}

impl MessageHeader {
    /// Create a header.
    pub fn new(msg_type: u16, payload_len: u32) -> Self {
        Self {
            msg_type,
            payload_len,
        }
    }

    /// Decode the header at the start of `src`.
    pub fn decode(src: &[u8]) -> std::result::Result<Self, HeaderFault> {
        if src.len() < HEADER_SIZE {
            return Err(HeaderFault::TooShort(src.len()));
        }
        if src[0..2] != MAGIC {
            return Err(HeaderFault::BadMagic([src[0], src[1]]));
        }
        let msg_type = u16::from_be_bytes([src[2], src[3]]);
        let payload_len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        Ok(Self {
            msg_type,
            payload_len,
        })
    }

    /// Append the 8 header bytes to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_slice(&MAGIC);
        dst.put_u16(self.msg_type);
        dst.put_u32(self.payload_len);
    }

    /// Total size of the message this header describes.
    pub fn message_len(&self) -> usize {
        HEADER_SIZE + self.payload_len as usize
    }
}

/// Build a complete logical message from a type and payload.
pub fn build_message(msg_type: u16, payload: &[u8]) -> Result<Bytes> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    MessageHeader::new(msg_type, payload_len).encode(&mut buf);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Check that `message` is exactly one well-formed logical message.
///
/// Fails with [`FrameError::MalformedMessage`] when the message is shorter
/// than a header, the magic is wrong, or the declared length does not match
/// the number of bytes present.
pub fn validate_message(message: &[u8]) -> Result<MessageHeader> {
    let header = MessageHeader::decode(message).map_err(|f| FrameError::malformed(f.to_string()))?;
    if header.message_len() != message.len() {
        return Err(FrameError::malformed(format!(
            "declared payload length {} does not match {} payload bytes",
            header.payload_len,
            message.len() - HEADER_SIZE
        )));
    }
    Ok(header)
}

/// Encode one report carrying `segment`.
///
/// Writes the report id, the segment, then zero padding up to
/// [`FRAME_SIZE`] bytes.
pub fn encode_frame(segment: &[u8], dst: &mut BytesMut) -> Result<()> {
    if segment.len() > SEGMENT_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: segment.len(),
            max: SEGMENT_SIZE,
        });
    }
    dst.reserve(FRAME_SIZE);
    dst.put_u8(REPORT_ID);
    dst.put_slice(segment);
    dst.put_bytes(0, SEGMENT_SIZE - segment.len());
    Ok(())
}

/// Validate `message` and cut it into reports, in wire order.
pub fn segment(message: &[u8]) -> Result<Vec<Bytes>> {
    validate_message(message)?;
    message
        .chunks(SEGMENT_SIZE)
        .map(|chunk| {
            let mut frame = BytesMut::with_capacity(FRAME_SIZE);
            encode_frame(chunk, &mut frame)?;
            Ok(frame.freeze())
        })
        .collect()
}

/// Configuration for the frame reader and writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum declared payload accepted on receive. Default: 2 MiB.
    pub max_payload_size: usize,
    /// Per-report receive timeout. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
        }
    }
}
