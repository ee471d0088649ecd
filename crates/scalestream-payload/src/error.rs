/// Errors that can occur while decoding a frame payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A text payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A text payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary payload is not valid MessagePack.
    #[error("payload is not valid MessagePack: {0}")]
    MsgPack(#[from] rmp_serde::decode::Error),

    /// A binary payload holds more than one MessagePack value.
    #[error("{} trailing bytes after MessagePack value", len - consumed)]
    TrailingBytes { consumed: usize, len: usize },
}

/// Errors that can occur while encoding a value for the wire.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack serialization failed.
    #[error("msgpack encoding failed: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
}

/// A decoded value does not have the shape of a sample.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The top-level value is not a map.
    #[error("expected a map at top level, found {found}")]
    NotAMap { found: &'static str },

    /// The readings key is present but does not hold an array.
    #[error("expected \"w\" to be an array, found {found}")]
    ReadingsNotArray { found: &'static str },

    /// A readings element is not a number.
    #[error("reading {index} is not a number (found {found})")]
    NonNumericReading { index: usize, found: &'static str },
}
