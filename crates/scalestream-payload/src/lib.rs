//! Payload decoding and sample extraction for scalestream frames.
//!
//! A frame's payload is decoded into a generic [`Value`] by the decoder its
//! tag selects (MessagePack for `'M'`, JSON for `'J'`), then mapped to a
//! [`Sample`]: a millisecond timestamp plus ordered channel readings.
//!
//! ```text
//! { "t": <optional integer, epoch milliseconds>,
//!   "w": <optional array of numbers, one per channel> }
//! ```

pub mod codec;
pub mod error;
pub mod sample;
pub mod value;

pub use codec::{JsonDecoder, MsgPackDecoder, PayloadCodec, PayloadDecoder};
pub use error::{DecodeError, EncodeError, ExtractError};
pub use sample::{
    extract_sample, extract_sample_at, now_millis, Sample, READINGS_KEY, TIMESTAMP_KEY,
};
pub use value::Value;
