use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{IngestError, Result};

/// One channel reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp_ms: u64,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp_ms: u64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// Fixed-capacity FIFO of the most recent readings on one channel.
///
/// Entries stay in arrival order, not timestamp order. The lock is held for
/// one push or one whole-buffer copy, never longer.
#[derive(Debug)]
pub struct ChannelBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<Reading>>,
}

impl ChannelBuffer {
    /// Create an empty buffer holding at most `capacity` readings.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IngestError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    /// Append a reading, evicting the oldest one when full.
    /// Returns the evicted reading, if any.
    pub(crate) fn push(&self, reading: Reading) -> Option<Reading> {
        let mut entries = self.entries.lock();
        let evicted = if entries.len() == self.capacity {
            entries.pop_front()
        } else {
            None
        };
        entries.push_back(reading);
        evicted
    }

    /// Copy of all readings, oldest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.entries.lock().iter().copied().collect()
    }

    /// Most recent reading.
    pub fn latest(&self) -> Option<Reading> {
        self.entries.lock().back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The fixed set of channel buffers shared between producer and consumer.
#[derive(Debug)]
pub struct ChannelSet {
    buffers: Vec<ChannelBuffer>,
}

impl ChannelSet {
    /// Create `channel_count` empty buffers of `capacity` readings each.
    pub fn new(channel_count: usize, capacity: usize) -> Result<Self> {
        if channel_count == 0 {
            return Err(IngestError::ZeroChannels);
        }
        let buffers = (0..channel_count)
            .map(|_| ChannelBuffer::new(capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { buffers })
    }

    pub fn channel_count(&self) -> usize {
        self.buffers.len()
    }

    /// Per-channel capacity.
    pub fn capacity(&self) -> usize {
        self.buffers[0].capacity()
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelBuffer> {
        self.buffers.get(index)
    }

    /// Copy of one channel's readings, or `None` for an unknown index.
    pub fn snapshot(&self, index: usize) -> Option<Vec<Reading>> {
        self.channel(index).map(ChannelBuffer::snapshot)
    }

    /// Copy of every channel, indexed by channel.
    ///
    /// Each channel is copied atomically on its own; the set as a whole is
    /// not a single point in time.
    pub fn snapshot_all(&self) -> Vec<Vec<Reading>> {
        self.buffers.iter().map(ChannelBuffer::snapshot).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelBuffer> {
        self.buffers.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn push_evicts_oldest_when_full() {
        let buffer = ChannelBuffer::new(3).unwrap();
        for (t, v) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
            assert_eq!(buffer.push(Reading::new(t, v)), None);
        }
        assert_eq!(buffer.push(Reading::new(4, 40.0)), Some(Reading::new(1, 10.0)));

        assert_eq!(
            buffer.snapshot(),
            vec![
                Reading::new(2, 20.0),
                Reading::new(3, 30.0),
                Reading::new(4, 40.0)
            ]
        );
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.latest(), Some(Reading::new(4, 40.0)));
    }

    #[test]
    fn arrival_order_is_kept() {
        let buffer = ChannelBuffer::new(4).unwrap();
        buffer.push(Reading::new(30, 1.0));
        buffer.push(Reading::new(10, 2.0));
        buffer.push(Reading::new(20, 3.0));

        let stamps: Vec<u64> = buffer.snapshot().iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(stamps, vec![30, 10, 20]);
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let buffer = ChannelBuffer::new(1).unwrap();
        buffer.push(Reading::new(1, 1.0));
        buffer.push(Reading::new(2, 2.0));
        assert_eq!(buffer.snapshot(), vec![Reading::new(2, 2.0)]);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            ChannelBuffer::new(0),
            Err(IngestError::ZeroCapacity)
        ));
        assert!(matches!(
            ChannelSet::new(0, 10),
            Err(IngestError::ZeroChannels)
        ));
        assert!(matches!(
            ChannelSet::new(4, 0),
            Err(IngestError::ZeroCapacity)
        ));
    }

    #[test]
    fn channel_set_shape() {
        let set = ChannelSet::new(4, 400).unwrap();
        assert_eq!(set.channel_count(), 4);
        assert_eq!(set.capacity(), 400);
        assert!(set.snapshot(3).unwrap().is_empty());
        assert!(set.snapshot(4).is_none());
        assert_eq!(set.snapshot_all().len(), 4);
        assert!(set.iter().all(ChannelBuffer::is_empty));
    }

    #[test]
    fn snapshots_never_see_a_partial_push() {
        let buffer = Arc::new(ChannelBuffer::new(64).unwrap());
        let writer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for t in 0..20_000u64 {
                    buffer.push(Reading::new(t, t as f64));
                }
            })
        };

        while !writer.is_finished() {
            let snapshot = buffer.snapshot();
            assert!(snapshot.len() <= 64);
            for pair in snapshot.windows(2) {
                assert_eq!(pair[1].timestamp_ms, pair[0].timestamp_ms + 1);
            }
        }
        writer.join().unwrap();

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 64);
        assert_eq!(snapshot.last().map(|r| r.timestamp_ms), Some(19_999));
    }
}
