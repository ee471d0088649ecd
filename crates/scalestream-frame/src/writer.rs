use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};

use crate::codec::{encode_frame, Tag, DEFAULT_MAX_PAYLOAD, NEWLINE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes frames, and the plain text lines firmware interleaves with them,
/// to any `Write` sink (serial port, file, pipe).
pub struct FrameWriter<W> {
    inner: W,
    buf: BytesMut,
    max_payload: usize,
}

impl<W: Write> FrameWriter<W> {
    /// Create a writer that accepts payloads up to [`DEFAULT_MAX_PAYLOAD`].
    pub fn new(inner: W) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a writer that refuses payloads longer than `max_payload`.
    pub fn with_max_payload(inner: W, max_payload: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
        }
    }

    /// Encode and send one frame. Returns the number of bytes written.
    pub fn send(&mut self, tag: Tag, payload: &[u8]) -> Result<usize> {
        if payload.len() > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload,
            });
        }

        self.buf.clear();
        encode_frame(tag, payload, &mut self.buf)?;
        self.write_buf()
    }

    /// Send `text` followed by a newline, outside any frame.
    ///
    /// The text must not contain a newline itself.
    pub fn send_line(&mut self, text: &str) -> Result<usize> {
        if text.as_bytes().contains(&NEWLINE) {
            return Err(FrameError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "text line contains a newline",
            )));
        }

        self.buf.clear();
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.put_u8(NEWLINE);
        self.write_buf()
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_buf(&mut self) -> Result<usize> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(offset),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}
