use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scalestream_frame::{Frame, FrameDecoder, FrameEvent};
use scalestream_payload::{extract_sample, PayloadCodec};
use scalestream_transport::{Transport, TransportError};
use tracing::{debug, trace};

use crate::buffer::ChannelSet;
use crate::error::Fault;
use crate::router::{ChannelRouter, Routed};
use crate::stats::IngestStats;

/// Result of handling one decoder event.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing arrived within the transport timeout.
    Idle,
    /// A sample was decoded and routed.
    Routed(Routed),
    /// A frame or sample was dropped.
    Dropped(Fault),
}

/// Decode → extract → route, for one frame at a time.
///
/// Holds no I/O of its own; [`Pipeline::run`] drives it from a
/// [`FrameDecoder`] until stopped or the transport fails.
#[derive(Debug)]
pub struct Pipeline {
    codec: PayloadCodec,
    router: ChannelRouter,
    stats: Arc<IngestStats>,
}

impl Pipeline {
    pub fn new(channels: Arc<ChannelSet>, stats: Arc<IngestStats>) -> Self {
        Self::with_codec(PayloadCodec::new(), channels, stats)
    }

    pub fn with_codec(
        codec: PayloadCodec,
        channels: Arc<ChannelSet>,
        stats: Arc<IngestStats>,
    ) -> Self {
        Self {
            codec,
            router: ChannelRouter::new(channels),
            stats,
        }
    }

    /// Decode a frame's payload and route the resulting sample.
    pub fn process(&self, frame: &Frame) -> Result<Routed, Fault> {
        let value = self.codec.decode_frame(frame)?;
        let sample = extract_sample(&value)?;
        Ok(self.router.route(&sample))
    }

    /// Handle one decoder event, logging and counting what happened.
    pub fn handle_event(&self, event: FrameEvent) -> Outcome {
        match event {
            FrameEvent::Idle => {
                self.stats.record_idle();
                Outcome::Idle
            }
            FrameEvent::Frame(frame) => {
                self.stats.record_frame();
                match self.process(&frame) {
                    Ok(routed) => {
                        self.stats.record_routed(&routed);
                        trace!(
                            encoding = frame.tag.name(),
                            size = frame.payload.len(),
                            routed = routed.routed,
                            ignored = routed.ignored,
                            "sample routed"
                        );
                        Outcome::Routed(routed)
                    }
                    Err(fault) => self.drop_fault(fault),
                }
            }
            FrameEvent::Dropped(fault) => self.drop_fault(fault.into()),
        }
    }

    /// Pull events from `decoder` until `stop` is set or the transport fails.
    ///
    /// The stop flag is checked once per decoder cycle, so shutdown latency
    /// is bounded by one transport timeout plus one frame.
    pub fn run<T: Transport>(
        &self,
        decoder: &mut FrameDecoder<T>,
        stop: &AtomicBool,
    ) -> Result<(), TransportError> {
        while !stop.load(Ordering::Acquire) {
            let event = decoder.next_event()?;
            self.handle_event(event);
        }
        Ok(())
    }

    pub fn channels(&self) -> &Arc<ChannelSet> {
        self.router.channels()
    }

    pub fn stats(&self) -> &Arc<IngestStats> {
        &self.stats
    }

    fn drop_fault(&self, fault: Fault) -> Outcome {
        self.stats.record_fault(&fault);
        debug!(kind = %fault.kind(), error = %fault, "dropped");
        Outcome::Dropped(fault)
    }
}
