//! Serial telemetry ingest with resynchronizing framing and bounded buffers.
//!
//! scalestream turns a noisy serial byte stream of tagged, length-prefixed
//! MessagePack/JSON messages into per-channel histories of the most recent
//! readings, ready for a live plot or logger to snapshot.
//!
//! # Crate Structure
//!
//! - [`transport`]: Timeout-tolerant byte source (serial port behind `serial` feature)
//! - [`frame`]: Tag/length framing, resync on garbage, frame writer
//! - [`payload`]: MessagePack/JSON payload decoding and sample extraction
//! - [`ingest`]: Background ingest thread and per-channel ring buffers

/// Re-export transport types.
pub mod transport {
    pub use scalestream_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use scalestream_frame::*;
}

/// Re-export payload types.
pub mod payload {
    pub use scalestream_payload::*;
}

/// Re-export ingest types.
pub mod ingest {
    pub use scalestream_ingest::*;
}
