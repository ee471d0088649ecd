use scalestream_frame::FrameConfig;

/// Default number of channels (one per load cell).
pub const DEFAULT_CHANNEL_COUNT: usize = 4;

/// Default readings kept per channel.
pub const DEFAULT_CAPACITY: usize = 400;

/// Controls the shape of the channel set and the ingest thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Number of channel buffers; readings past this index are ignored.
    pub channel_count: usize,
    /// Readings kept per channel before the oldest is evicted.
    pub capacity: usize,
    /// Frame decoder limits.
    pub frame: FrameConfig,
    /// Name given to the ingest thread.
    pub thread_name: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel_count: DEFAULT_CHANNEL_COUNT,
            capacity: DEFAULT_CAPACITY,
            frame: FrameConfig::default(),
            thread_name: "scalestream-ingest".to_string(),
        }
    }
}
