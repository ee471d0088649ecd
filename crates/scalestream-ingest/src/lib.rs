//! Background ingest loop and bounded per-channel sample buffers.
//!
//! This is the "just works" layer: hand it a transport and it decodes frames
//! on a dedicated thread, routing each sample's readings into fixed-capacity
//! channel buffers that a consumer can snapshot at any time.
//!
//! ```text
//! Transport → FrameDecoder → PayloadCodec → extract_sample → ChannelRouter → ChannelSet
//!                                                                               ↑
//!                                                               consumer snapshots
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod router;
pub mod stats;
pub mod worker;

pub use buffer::{ChannelBuffer, ChannelSet, Reading};
pub use config::{IngestConfig, DEFAULT_CAPACITY, DEFAULT_CHANNEL_COUNT};
pub use error::{Fault, FaultKind, IngestError, Result};
pub use pipeline::{Outcome, Pipeline};
pub use router::{ChannelRouter, Routed};
pub use stats::{IngestStats, StatsSnapshot};
pub use worker::{spawn, IngestHandle};
