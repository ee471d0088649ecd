//! Tag/length framing with resynchronization for serial telemetry streams.
//!
//! Every message on the wire is framed with:
//! - A 1-byte tag selecting the payload encoding (`'M'` MessagePack, `'J'` JSON)
//! - A 4-byte little-endian payload length
//! - The payload itself
//!
//! The decoder never gives up on a corrupt stream: truncated frames are
//! abandoned, unknown tag bytes trigger a skip to the next newline, and only a
//! fatal transport error is reported as an error.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod writer;

pub use codec::{
    encode_frame, Frame, FrameConfig, Tag, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, LENGTH_SIZE, NEWLINE,
    TAG_BINARY, TAG_TEXT,
};
pub use decoder::{FrameDecoder, FrameEvent, FrameFault};
pub use error::{FrameError, Result};
pub use writer::FrameWriter;
