use scalestream_frame::{Frame, Tag};
use serde::Deserialize;

use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

/// Turns raw payload bytes into a [`Value`].
pub trait PayloadDecoder: Send + Sync {
    /// Short encoding name, used in logs.
    fn encoding(&self) -> &'static str;

    /// Decode one payload.
    fn decode(&self, payload: &[u8]) -> Result<Value, DecodeError>;
}

/// Decodes MessagePack maps and arrays.
///
/// The payload must hold exactly one value; bytes left over after it are
/// rejected as [`DecodeError::TrailingBytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackDecoder;

impl PayloadDecoder for MsgPackDecoder {
    fn encoding(&self) -> &'static str {
        "msgpack"
    }

    fn decode(&self, payload: &[u8]) -> Result<Value, DecodeError> {
        let mut rest = payload;
        let value = {
            let mut de = rmp_serde::Deserializer::new(&mut rest);
            Value::deserialize(&mut de)?
        };
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes {
                consumed: payload.len() - rest.len(),
                len: payload.len(),
            });
        }
        Ok(value)
    }
}

/// Decodes UTF-8 JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn encoding(&self) -> &'static str {
        "json"
    }

    fn decode(&self, payload: &[u8]) -> Result<Value, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        Ok(serde_json::from_str(text)?)
    }
}

/// Selects a [`PayloadDecoder`] by frame tag.
pub struct PayloadCodec {
    binary: Box<dyn PayloadDecoder>,
    text: Box<dyn PayloadDecoder>,
}

impl PayloadCodec {
    /// MessagePack for binary frames, JSON for text frames.
    pub fn new() -> Self {
        Self::with_decoders(Box::new(MsgPackDecoder), Box::new(JsonDecoder))
    }

    /// Use custom decoders for either tag.
    pub fn with_decoders(binary: Box<dyn PayloadDecoder>, text: Box<dyn PayloadDecoder>) -> Self {
        Self { binary, text }
    }

    /// The decoder responsible for `tag`.
    pub fn decoder(&self, tag: Tag) -> &dyn PayloadDecoder {
        match tag {
            Tag::Binary => self.binary.as_ref(),
            Tag::Text => self.text.as_ref(),
        }
    }

    /// Decode a payload with the decoder `tag` selects.
    pub fn decode(&self, tag: Tag, payload: &[u8]) -> Result<Value, DecodeError> {
        self.decoder(tag).decode(payload)
    }

    /// Decode a frame's payload.
    pub fn decode_frame(&self, frame: &Frame) -> Result<Value, DecodeError> {
        self.decode(frame.tag, frame.payload.as_ref())
    }

    /// Encode a value in the format `tag` selects.
    pub fn encode(tag: Tag, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match tag {
            Tag::Binary => Ok(rmp_serde::to_vec(value)?),
            Tag::Text => Ok(serde_json::to_vec(value)?),
        }
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodec")
            .field("binary", &self.binary.encoding())
            .field("text", &self.text.encoding())
            .finish()
    }
}
