use std::sync::Arc;

use scalestream_payload::Sample;

use crate::buffer::{ChannelSet, Reading};

/// What routing a sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Routed {
    /// Readings pushed into a channel buffer.
    pub routed: usize,
    /// Readings beyond the last channel, dropped.
    pub ignored: usize,
    /// Readings evicted from full buffers to make room.
    pub evicted: usize,
}

/// Fans a sample's readings out to the channel buffers by index.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    channels: Arc<ChannelSet>,
}

impl ChannelRouter {
    pub fn new(channels: Arc<ChannelSet>) -> Self {
        Self { channels }
    }

    /// Push `readings[i]` into channel `i` for every channel that has a
    /// reading. Channels without one are left untouched.
    pub fn route(&self, sample: &Sample) -> Routed {
        let mut outcome = Routed::default();
        for (buffer, &value) in self.channels.iter().zip(&sample.readings) {
            if buffer
                .push(Reading::new(sample.timestamp_ms, value))
                .is_some()
            {
                outcome.evicted += 1;
            }
            outcome.routed += 1;
        }
        outcome.ignored = sample.readings.len() - outcome.routed;
        outcome
    }

    pub fn channels(&self) -> &Arc<ChannelSet> {
        &self.channels
    }
}
