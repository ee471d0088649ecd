use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Tag byte for a MessagePack payload ('M').
pub const TAG_BINARY: u8 = 0x4D;

/// Tag byte for a UTF-8 JSON payload ('J').
pub const TAG_TEXT: u8 = 0x4A;

/// Size of the little-endian length field.
pub const LENGTH_SIZE: usize = 4;

/// Frame header: tag (1) + length (4) = 5 bytes.
pub const HEADER_SIZE: usize = 1 + LENGTH_SIZE;

/// Resynchronization delimiter.
pub const NEWLINE: u8 = 0x0A;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Payload encoding selected by the frame's tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// MessagePack map/array encoding.
    Binary,
    /// UTF-8 JSON text.
    Text,
}

impl Tag {
    /// Map a wire byte to a tag; `None` for anything unrecognized.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TAG_BINARY => Some(Tag::Binary),
            TAG_TEXT => Some(Tag::Text),
            _ => None,
        }
    }

    /// The wire byte for this tag.
    pub fn as_byte(self) -> u8 {
        match self {
            Tag::Binary => TAG_BINARY,
            Tag::Text => TAG_TEXT,
        }
    }

    /// Human-readable encoding name.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Binary => "msgpack",
            Tag::Text => "json",
        }
    }
}

/// A decoded frame: the payload bytes and how they are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload encoding.
    pub tag: Tag,
    /// The raw payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(tag: Tag, payload: impl Into<Bytes>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬─────────────────┐
/// │ Tag (1B) │ Length    │ Payload         │
/// │ 'M'/'J'  │ (4B LE)   │ (Length bytes)  │
/// └──────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(tag: Tag, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(tag.as_byte());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for the frame decoder and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Upper bound on bytes discarded by a single resync.
    /// `None` skips until a newline or a timeout, however long that takes.
    pub max_resync_bytes: Option<usize>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_resync_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let mut buf = BytesMut::new();
        encode_frame(Tag::Text, b"{}", &mut buf).unwrap();

        assert_eq!(buf.as_ref(), &[0x4A, 0x02, 0x00, 0x00, 0x00, b'{', b'}']);
    }

    #[test]
    fn test_length_is_little_endian() {
        let payload = vec![0u8; 0x0102];
        let mut buf = BytesMut::new();
        encode_frame(Tag::Binary, &payload, &mut buf).unwrap();

        assert_eq!(&buf[..HEADER_SIZE], &[0x4D, 0x02, 0x01, 0x00, 0x00]);
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(Tag::Binary, b"", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x4D, 0, 0, 0, 0]);
    }

    #[test]
    fn test_tag_bytes() {
        assert_eq!(Tag::from_byte(b'M'), Some(Tag::Binary));
        assert_eq!(Tag::from_byte(b'J'), Some(Tag::Text));
        assert_eq!(Tag::from_byte(b'm'), None);
        assert_eq!(Tag::from_byte(NEWLINE), None);
        assert_eq!(Tag::Binary.as_byte(), TAG_BINARY);
        assert_eq!(Tag::Text.name(), "json");
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(Tag::Text, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
    }
}
