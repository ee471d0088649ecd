use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use scalestream_frame::FrameDecoder;
use scalestream_transport::{Transport, TransportError};
use tracing::{error, info};

use crate::buffer::ChannelSet;
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::pipeline::Pipeline;
use crate::stats::{IngestStats, StatsSnapshot};

type LoopResult = std::result::Result<(), TransportError>;

/// Clears the liveness flag when the ingest thread exits, panics included.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Start the ingest loop on its own thread.
///
/// The thread owns `transport` and runs until [`IngestHandle::stop`] is
/// called or the transport reports a fatal error.
pub fn spawn<T>(transport: T, config: IngestConfig) -> Result<IngestHandle>
where
    T: Transport + 'static,
{
    let channels = Arc::new(ChannelSet::new(config.channel_count, config.capacity)?);
    let stats = Arc::new(IngestStats::default());
    let stop = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicBool::new(true));
    let (tx, rx) = mpsc::sync_channel::<LoopResult>(1);

    let pipeline = Pipeline::new(Arc::clone(&channels), Arc::clone(&stats));
    let thread_stop = Arc::clone(&stop);
    let alive = AliveGuard(Arc::clone(&running));
    let frame_config = config.frame.clone();
    let channel_count = config.channel_count;
    let capacity = config.capacity;

    let thread = thread::Builder::new()
        .name(config.thread_name)
        .spawn(move || {
            let _alive = alive;
            info!(channel_count, capacity, "ingest started");

            let mut decoder = FrameDecoder::with_config(transport, frame_config);
            let result = pipeline.run(&mut decoder, &thread_stop);
            match &result {
                Ok(()) => info!("ingest stopped"),
                Err(TransportError::Closed) => info!("transport closed, ingest ended"),
                Err(e) => error!(error = %e, "ingest ended on transport error"),
            }
            let _ = tx.send(result);
        })
        .map_err(IngestError::Spawn)?;

    Ok(IngestHandle {
        channels,
        stats,
        stop,
        running,
        result: rx,
        thread: Some(thread),
    })
}

/// Owner's handle to a running ingest thread.
///
/// Dropping the handle signals the thread to stop but does not wait for it.
#[derive(Debug)]
pub struct IngestHandle {
    channels: Arc<ChannelSet>,
    stats: Arc<IngestStats>,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    result: Receiver<LoopResult>,
    thread: Option<JoinHandle<()>>,
}

impl IngestHandle {
    /// Shared channel buffers, for the consumer to snapshot.
    pub fn channels(&self) -> Arc<ChannelSet> {
        Arc::clone(&self.channels)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the ingest thread is still alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the thread to stop after its current decoder cycle.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Wait for the thread to end on its own, without signalling stop.
    pub fn join(mut self) -> Result<()> {
        let outcome = self.result.recv().map_err(|_| IngestError::Panicked);
        self.finish(outcome)
    }

    /// Wait up to `timeout` for the thread to end.
    ///
    /// On [`IngestError::JoinTimeout`] the thread is still running and the
    /// call may be retried. Once the thread has been joined, later calls
    /// return `Ok(())`.
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<()> {
        if self.thread.is_none() {
            return Ok(());
        }
        let outcome = match self.result.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => return Err(IngestError::JoinTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(IngestError::Panicked),
        };
        self.finish(outcome)
    }

    /// Signal stop and wait up to `timeout` for the thread to end.
    pub fn shutdown(mut self, timeout: Duration) -> Result<()> {
        self.stop();
        self.join_timeout(timeout)
    }

    fn finish(&mut self, outcome: Result<LoopResult>) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                return Err(IngestError::Panicked);
            }
        }
        outcome?.map_err(IngestError::from)
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Instant;

    use bytes::BytesMut;
    use scalestream_frame::{encode_frame, Tag};
    use scalestream_transport::{ScriptedTransport, Step};

    use super::*;
    use crate::buffer::Reading;

    const TICK: Duration = Duration::from_millis(5);
    const DEADLINE: Duration = Duration::from_secs(5);

    fn frames(payloads: &[(Tag, &str)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (tag, payload) in payloads {
            encode_frame(*tag, payload.as_bytes(), &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let start = Instant::now();
        while !condition() {
            assert!(start.elapsed() < DEADLINE, "condition not met in time");
            thread::sleep(TICK);
        }
    }

    #[test]
    fn samples_reach_the_consumer() {
        let bytes = frames(&[
            (Tag::Text, r#"{"t":1,"w":[1,2,3,4,5]}"#),
            (Tag::Text, r#"{"t":2,"w":[6]}"#),
        ]);
        let transport = ScriptedTransport::from_bytes(bytes).with_idle_delay(TICK);
        let handle = spawn(transport, IngestConfig::default()).unwrap();
        let channels = handle.channels();

        wait_until(|| handle.stats().samples == 2);
        assert!(handle.is_running());
        assert_eq!(
            channels.snapshot(0).unwrap(),
            vec![Reading::new(1, 1.0), Reading::new(2, 6.0)]
        );
        assert_eq!(channels.snapshot(3).unwrap(), vec![Reading::new(1, 4.0)]);
        assert_eq!(handle.stats().readings_ignored, 1);

        handle.shutdown(DEADLINE).unwrap();
        assert_eq!(channels.snapshot(0).unwrap().len(), 2);
    }

    #[test]
    fn shutdown_stops_an_idle_thread() {
        let transport = ScriptedTransport::default().with_idle_delay(TICK);
        let handle = spawn(transport, IngestConfig::default()).unwrap();
        wait_until(|| handle.stats().idle_reads > 0);

        let running = Arc::clone(&handle.running);
        handle.shutdown(DEADLINE).unwrap();
        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn fatal_transport_error_ends_the_thread() {
        let transport = ScriptedTransport::new([
            Step::Data(b"garbage\n".to_vec()),
            Step::Data(frames(&[(Tag::Text, "{bad")])),
            Step::Fatal(ErrorKind::NotConnected),
        ]);
        let handle = spawn(transport, IngestConfig::default()).unwrap();

        wait_until(|| !handle.is_running());
        let stats = handle.stats();
        assert_eq!(stats.unrecognized_tags, 1);
        assert_eq!(stats.decode_failures, 1);

        match handle.join() {
            Err(IngestError::Transport(e)) => {
                assert_eq!(e.io_kind(), Some(ErrorKind::NotConnected))
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn closed_transport_is_reported() {
        let transport = ScriptedTransport::from_bytes(b"J".to_vec()).closed_when_exhausted();
        let mut handle = spawn(transport, IngestConfig::default()).unwrap();

        assert!(matches!(
            handle.join_timeout(DEADLINE),
            Err(IngestError::Transport(TransportError::Closed))
        ));
        assert!(!handle.is_running());
        assert!(handle.join_timeout(DEADLINE).is_ok());
    }

    #[test]
    fn join_timeout_leaves_the_thread_running() {
        let transport = ScriptedTransport::default().with_idle_delay(TICK);
        let mut handle = spawn(transport, IngestConfig::default()).unwrap();

        assert!(matches!(
            handle.join_timeout(Duration::from_millis(20)),
            Err(IngestError::JoinTimeout(_))
        ));
        assert!(handle.is_running());
        handle.shutdown(DEADLINE).unwrap();
    }

    #[test]
    fn dropping_the_handle_stops_the_thread() {
        let transport = ScriptedTransport::default().with_idle_delay(TICK);
        let handle = spawn(transport, IngestConfig::default()).unwrap();
        let running = Arc::clone(&handle.running);

        drop(handle);
        wait_until(|| !running.load(Ordering::Acquire));
    }

    #[test]
    fn invalid_config_is_rejected_before_spawning() {
        let config = IngestConfig {
            channel_count: 0,
            ..IngestConfig::default()
        };
        assert!(matches!(
            spawn(ScriptedTransport::default(), config),
            Err(IngestError::ZeroChannels)
        ));
    }
}
