use bytes::BytesMut;
use scalestream_transport::{Result, Transport};
use tracing::trace;

use crate::codec::{Frame, FrameConfig, Tag, LENGTH_SIZE, NEWLINE};

/// Consecutive empty reads tolerated while collecting the length field.
const LENGTH_IDLE_LIMIT: usize = 2;

/// Consecutive empty reads tolerated while collecting the payload.
const PAYLOAD_IDLE_LIMIT: usize = 1;

/// Outcome of one full decoder cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete frame, ready for payload decoding.
    Frame(Frame),
    /// The transport timed out while waiting for a tag byte.
    Idle,
    /// Input was discarded; the decoder is back to waiting for a tag.
    Dropped(FrameFault),
}

/// Why a decoder cycle discarded input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameFault {
    /// The transport went quiet before all four length bytes arrived.
    #[error("truncated length field ({received} of 4 bytes)")]
    TruncatedLength { received: usize },

    /// The transport went quiet before the payload was complete.
    #[error("truncated payload ({received} of {expected} bytes)")]
    TruncatedPayload { expected: usize, received: usize },

    /// The length field exceeds the configured maximum; the payload is not read.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The tag byte was not recognized and the stream was skipped.
    ///
    /// `discarded` counts the tag byte itself. `resynced` is true when a
    /// newline was consumed, false when a timeout or the resync limit ended
    /// the skip first.
    #[error("unrecognized tag byte {byte:#04x} ({discarded} bytes discarded)")]
    UnrecognizedTag {
        byte: u8,
        discarded: usize,
        resynced: bool,
    },
}

/// Reads frames from a [`Transport`] one state-machine cycle at a time.
///
/// Each call to [`FrameDecoder::next_event`] starts waiting for a tag byte
/// and returns once the cycle is over, so callers can check for cancellation
/// between frames. Only a fatal transport error is returned as `Err`.
pub struct FrameDecoder<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Transport> FrameDecoder<T> {
    /// Create a new decoder with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new decoder with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Run one decoder cycle.
    pub fn next_event(&mut self) -> Result<FrameEvent> {
        let byte = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(FrameEvent::Idle),
        };
        let tag = match Tag::from_byte(byte) {
            Some(tag) => tag,
            None => return self.resync(byte),
        };

        let mut length = [0u8; LENGTH_SIZE];
        let received = self.fill(&mut length, LENGTH_IDLE_LIMIT)?;
        if received < LENGTH_SIZE {
            return Ok(FrameEvent::Dropped(FrameFault::TruncatedLength { received }));
        }

        let length = u32::from_le_bytes(length) as usize;
        if length > self.config.max_payload_size {
            return Ok(FrameEvent::Dropped(FrameFault::PayloadTooLarge {
                size: length,
                max: self.config.max_payload_size,
            }));
        }

        let mut payload = BytesMut::zeroed(length);
        let received = self.fill(&mut payload, PAYLOAD_IDLE_LIMIT)?;
        if received < length {
            return Ok(FrameEvent::Dropped(FrameFault::TruncatedPayload {
                expected: length,
                received,
            }));
        }

        Ok(FrameEvent::Frame(Frame::new(tag, payload.freeze())))
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the decoder and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Fill `buf`, giving up after `idle_limit` consecutive empty reads.
    /// Returns the number of bytes collected.
    fn fill(&mut self, buf: &mut [u8], idle_limit: usize) -> Result<usize> {
        let mut filled = 0usize;
        let mut idle = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..])? {
                0 => {
                    idle += 1;
                    if idle >= idle_limit {
                        break;
                    }
                }
                n => {
                    idle = 0;
                    filled += n;
                }
            }
        }
        Ok(filled)
    }

    fn resync(&mut self, byte: u8) -> Result<FrameEvent> {
        let mut discarded = 1usize;
        let mut resynced = byte == NEWLINE;

        while !resynced {
            if self
                .config
                .max_resync_bytes
                .is_some_and(|limit| discarded >= limit)
            {
                break;
            }
            match self.read_byte()? {
                Some(next) => {
                    discarded += 1;
                    resynced = next == NEWLINE;
                }
                None => break,
            }
        }

        trace!(byte, discarded, resynced, "skipped unrecognized input");
        Ok(FrameEvent::Dropped(FrameFault::UnrecognizedTag {
            byte,
            discarded,
            resynced,
        }))
    }
}

impl<T> std::fmt::Debug for FrameDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use bytes::BytesMut;
    use scalestream_transport::{ReadTransport, ScriptedTransport, Step, TransportError};

    use super::*;
    use crate::codec::{encode_frame, TAG_BINARY};

    fn wire(frames: &[(Tag, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (tag, payload) in frames {
            encode_frame(*tag, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn expect_frame(event: FrameEvent) -> Frame {
        match event {
            FrameEvent::Frame(frame) => frame,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn roundtrip_binary_and_text() {
        let bytes = wire(&[
            (Tag::Binary, &b"\x81\xa1t\x01"[..]),
            (Tag::Text, &b"{\"w\":[1]}"[..]),
        ]);
        let mut decoder = FrameDecoder::new(ScriptedTransport::from_bytes(bytes));

        let first = expect_frame(decoder.next_event().unwrap());
        assert_eq!(first.tag, Tag::Binary);
        assert_eq!(first.payload.as_ref(), b"\x81\xa1t\x01");

        let second = expect_frame(decoder.next_event().unwrap());
        assert_eq!(second.tag, Tag::Text);
        assert_eq!(second.payload.as_ref(), b"{\"w\":[1]}");

        assert_eq!(decoder.next_event().unwrap(), FrameEvent::Idle);
    }

    #[test]
    fn payload_accumulates_across_reads() {
        let mut steps: Vec<Step> = wire(&[(Tag::Text, b"[1,2,3,4]")])
            .chunks(2)
            .map(|chunk| Step::Data(chunk.to_vec()))
            .collect();
        steps.push(Step::Timeout);
        let mut decoder = FrameDecoder::new(ScriptedTransport::new(steps));

        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.payload.as_ref(), b"[1,2,3,4]");
    }

    #[test]
    fn empty_payload_is_a_frame() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::from_bytes(wire(&[(
            Tag::Binary,
            b"",
        )])));
        let frame = expect_frame(decoder.next_event().unwrap());
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn timeout_while_awaiting_tag_is_idle() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([Step::Timeout]));
        assert_eq!(decoder.next_event().unwrap(), FrameEvent::Idle);
    }

    #[test]
    fn truncated_length_recovers_on_next_frame() {
        let next = wire(&[(Tag::Text, b"{}")]);
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([
            Step::Data(vec![TAG_BINARY, 0x10, 0x00]),
            Step::Timeout,
            Step::Timeout,
            Step::Data(next),
        ]));

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::TruncatedLength { received: 2 })
        );
        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.tag, Tag::Text);
        assert_eq!(frame.payload.as_ref(), b"{}");
    }

    #[test]
    fn single_timeout_inside_length_is_tolerated() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([
            Step::Data(vec![b'J', 0x02, 0x00]),
            Step::Timeout,
            Step::Data(vec![0x00, 0x00, b'{', b'}']),
        ]));

        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.payload.as_ref(), b"{}");
    }

    #[test]
    fn truncated_payload_is_discarded() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([
            Step::Data(vec![b'J', 0x08, 0x00, 0x00, 0x00, b'{', b'"']),
            Step::Timeout,
            Step::Data(wire(&[(Tag::Text, b"[]")])),
        ]));

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::TruncatedPayload {
                expected: 8,
                received: 2
            })
        );
        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.payload.as_ref(), b"[]");
    }

    #[test]
    fn unrecognized_tag_skips_through_newline() {
        let mut bytes = vec![0xFF, 0x41, 0x42, 0x0A];
        bytes.extend_from_slice(&[0x4A, 0x02, 0x00, 0x00, 0x00, b'{', b'}']);
        let mut decoder = FrameDecoder::new(ScriptedTransport::from_bytes(bytes));

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::UnrecognizedTag {
                byte: 0xFF,
                discarded: 4,
                resynced: true
            })
        );
        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.tag, Tag::Text);
        assert_eq!(frame.payload.as_ref(), b"{}");
    }

    #[test]
    fn debug_text_lines_are_skipped() {
        let mut bytes = b"Pong Activated!\r\n".to_vec();
        bytes.extend(wire(&[(Tag::Text, b"{\"w\":[]}")]));
        let mut decoder = FrameDecoder::new(ScriptedTransport::from_bytes(bytes));

        assert!(matches!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::UnrecognizedTag {
                byte: b'P',
                resynced: true,
                ..
            })
        ));
        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.payload.as_ref(), b"{\"w\":[]}");
    }

    #[test]
    fn newline_as_tag_completes_resync_immediately() {
        let mut bytes = vec![NEWLINE];
        bytes.extend(wire(&[(Tag::Text, b"{}")]));
        let mut decoder = FrameDecoder::new(ScriptedTransport::from_bytes(bytes));

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::UnrecognizedTag {
                byte: NEWLINE,
                discarded: 1,
                resynced: true
            })
        );
        assert!(matches!(decoder.next_event().unwrap(), FrameEvent::Frame(_)));
    }

    #[test]
    fn resync_ends_on_timeout() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([
            Step::Data(vec![0x00, 0x01, 0x02]),
            Step::Timeout,
            Step::Data(wire(&[(Tag::Text, b"{}")])),
        ]));

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::UnrecognizedTag {
                byte: 0x00,
                discarded: 3,
                resynced: false
            })
        );
        assert!(matches!(decoder.next_event().unwrap(), FrameEvent::Frame(_)));
    }

    #[test]
    fn resync_limit_bounds_discarded_bytes() {
        let config = FrameConfig {
            max_resync_bytes: Some(4),
            ..FrameConfig::default()
        };
        let mut decoder =
            FrameDecoder::with_config(ScriptedTransport::from_bytes(vec![0x00; 10]), config);

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::UnrecognizedTag {
                byte: 0x00,
                discarded: 4,
                resynced: false
            })
        );
    }

    #[test]
    fn oversized_length_is_dropped_without_reading_payload() {
        let config = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(
            ScriptedTransport::from_bytes(vec![b'M', 0x00, 0x04, 0x00, 0x00]),
            config,
        );

        assert_eq!(
            decoder.next_event().unwrap(),
            FrameEvent::Dropped(FrameFault::PayloadTooLarge {
                size: 1024,
                max: 16
            })
        );
    }

    #[test]
    fn fatal_transport_error_propagates() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([
            Step::Data(vec![b'J', 0x05]),
            Step::Fatal(ErrorKind::BrokenPipe),
        ]));

        let err = decoder.next_event().unwrap_err();
        assert_eq!(err.io_kind(), Some(ErrorKind::BrokenPipe));
    }

    #[test]
    fn closed_capture_file_ends_decoding() {
        let bytes = wire(&[(Tag::Text, b"{}")]);
        let transport = ReadTransport::new(Cursor::new(bytes)).closed_on_eof();
        let mut decoder = FrameDecoder::new(transport);

        assert!(matches!(decoder.next_event().unwrap(), FrameEvent::Frame(_)));
        assert!(matches!(
            decoder.next_event(),
            Err(TransportError::Closed)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(std::time::Duration::from_millis(50)))
            .unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut decoder = FrameDecoder::new(ReadTransport::new(right));

        writer.send(Tag::Text, b"{\"t\":1}").unwrap();
        let frame = expect_frame(decoder.next_event().unwrap());
        assert_eq!(frame.payload.as_ref(), b"{\"t\":1}");

        // Nothing else was written, so the socket timeout surfaces as idle.
        assert_eq!(decoder.next_event().unwrap(), FrameEvent::Idle);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut decoder = FrameDecoder::new(ScriptedTransport::new([]));
        assert_eq!(decoder.config(), &FrameConfig::default());
        let _ = decoder.get_ref();
        let _ = decoder.get_mut();
        let transport = decoder.into_inner();
        assert_eq!(transport.remaining(), 0);
    }
}
