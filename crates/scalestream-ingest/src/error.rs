use std::time::Duration;

use scalestream_frame::FrameFault;
use scalestream_payload::{DecodeError, ExtractError};
use scalestream_transport::TransportError;

/// Errors that can occur while setting up or running the ingest loop.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A channel set needs at least one channel.
    #[error("channel count must be at least 1")]
    ZeroChannels,

    /// A channel buffer needs room for at least one reading.
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,

    /// The transport failed; the ingest loop has ended.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The ingest thread could not be started.
    #[error("failed to spawn ingest thread: {0}")]
    Spawn(std::io::Error),

    /// The ingest thread did not finish within the allotted time.
    #[error("ingest thread did not stop within {0:?}")]
    JoinTimeout(Duration),

    /// The ingest thread panicked.
    #[error("ingest thread panicked")]
    Panicked,
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// A frame or sample that was dropped. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// The decoder discarded input.
    #[error("{0}")]
    Frame(FrameFault),

    /// The payload could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The decoded value is not a sample.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

impl From<FrameFault> for Fault {
    fn from(fault: FrameFault) -> Self {
        Fault::Frame(fault)
    }
}

/// Category of a dropped frame or sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Length or payload read incomplete.
    TruncatedFrame,
    /// Length field above the configured maximum.
    OversizedFrame,
    /// Tag byte not recognized; the stream was resynchronized.
    UnrecognizedTag,
    /// Payload is not valid MessagePack/JSON.
    DecodeFailure,
    /// Decoded value does not have the sample shape.
    ExtractionFailure,
}

impl Fault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::Frame(FrameFault::TruncatedLength { .. })
            | Fault::Frame(FrameFault::TruncatedPayload { .. }) => FaultKind::TruncatedFrame,
            Fault::Frame(FrameFault::PayloadTooLarge { .. }) => FaultKind::OversizedFrame,
            Fault::Frame(FrameFault::UnrecognizedTag { .. }) => FaultKind::UnrecognizedTag,
            Fault::Decode(_) => FaultKind::DecodeFailure,
            Fault::Extract(_) => FaultKind::ExtractionFailure,
        }
    }
}

impl FaultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::TruncatedFrame => "truncated_frame",
            FaultKind::OversizedFrame => "oversized_frame",
            FaultKind::UnrecognizedTag => "unrecognized_tag",
            FaultKind::DecodeFailure => "decode_failure",
            FaultKind::ExtractionFailure => "extraction_failure",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
