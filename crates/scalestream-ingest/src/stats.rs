use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{Fault, FaultKind};
use crate::router::Routed;

/// Counters updated by the ingest loop; readable from any thread.
#[derive(Debug, Default)]
pub struct IngestStats {
    frames: AtomicU64,
    samples: AtomicU64,
    idle_reads: AtomicU64,
    truncated_frames: AtomicU64,
    oversized_frames: AtomicU64,
    unrecognized_tags: AtomicU64,
    resync_bytes: AtomicU64,
    decode_failures: AtomicU64,
    extraction_failures: AtomicU64,
    readings_routed: AtomicU64,
    readings_ignored: AtomicU64,
    readings_evicted: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub samples: u64,
    pub idle_reads: u64,
    pub truncated_frames: u64,
    pub oversized_frames: u64,
    pub unrecognized_tags: u64,
    pub resync_bytes: u64,
    pub decode_failures: u64,
    pub extraction_failures: u64,
    pub readings_routed: u64,
    pub readings_ignored: u64,
    pub readings_evicted: u64,
}

impl StatsSnapshot {
    /// Total frames or samples dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.truncated_frames
            + self.oversized_frames
            + self.unrecognized_tags
            + self.decode_failures
            + self.extraction_failures
    }
}

impl IngestStats {
    pub(crate) fn record_idle(&self) {
        self.idle_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_routed(&self, routed: &Routed) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.readings_routed
            .fetch_add(routed.routed as u64, Ordering::Relaxed);
        self.readings_ignored
            .fetch_add(routed.ignored as u64, Ordering::Relaxed);
        self.readings_evicted
            .fetch_add(routed.evicted as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self, fault: &Fault) {
        let counter = match fault.kind() {
            FaultKind::TruncatedFrame => &self.truncated_frames,
            FaultKind::OversizedFrame => &self.oversized_frames,
            FaultKind::UnrecognizedTag => &self.unrecognized_tags,
            FaultKind::DecodeFailure => &self.decode_failures,
            FaultKind::ExtractionFailure => &self.extraction_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Fault::Frame(scalestream_frame::FrameFault::UnrecognizedTag { discarded, .. }) =
            fault
        {
            self.resync_bytes
                .fetch_add(*discarded as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            idle_reads: self.idle_reads.load(Ordering::Relaxed),
            truncated_frames: self.truncated_frames.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            unrecognized_tags: self.unrecognized_tags.load(Ordering::Relaxed),
            resync_bytes: self.resync_bytes.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            readings_routed: self.readings_routed.load(Ordering::Relaxed),
            readings_ignored: self.readings_ignored.load(Ordering::Relaxed),
            readings_evicted: self.readings_evicted.load(Ordering::Relaxed),
        }
    }
}
