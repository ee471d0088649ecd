use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A blocking byte source with a bounded read timeout.
///
/// `read` fills up to `buf.len()` bytes and returns how many arrived.
/// `Ok(0)` means nothing arrived within the timeout window; it is the normal
/// "no data yet" signal, never an error. `Err` is reserved for conditions the
/// transport cannot recover from (device removed, stream closed).
pub trait Transport: Send {
    /// Read whatever is available, blocking for at most one timeout window.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

/// Adapts any [`Read`] into a [`Transport`].
///
/// `TimedOut` and `WouldBlock` become empty reads and `Interrupted` is
/// retried. End of stream is an empty read by default (a serial device that
/// has nothing to say looks the same), returned after sleeping for the EOF
/// idle window so a drained source does not spin its caller. Call
/// [`ReadTransport::closed_on_eof`] for sources such as capture files, where
/// end of stream means [`TransportError::Closed`].
pub struct ReadTransport<R> {
    inner: R,
    closed_on_eof: bool,
    eof_idle: Duration,
}

/// Sleep before reporting end of stream as an empty read.
pub const DEFAULT_EOF_IDLE: Duration = Duration::from_millis(100);

impl<R: Read + Send> ReadTransport<R> {
    /// Wrap a reader; end of stream reads as a timeout after
    /// [`DEFAULT_EOF_IDLE`].
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed_on_eof: false,
            eof_idle: DEFAULT_EOF_IDLE,
        }
    }

    /// How long an end-of-stream read blocks before returning `Ok(0)`.
    pub fn with_eof_idle(mut self, eof_idle: Duration) -> Self {
        self.eof_idle = eof_idle;
        self
    }

    /// Treat end of stream as a fatal [`TransportError::Closed`].
    pub fn closed_on_eof(mut self) -> Self {
        self.closed_on_eof = true;
        self
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the transport and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> Transport for ReadTransport<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) if self.closed_on_eof => return Err(TransportError::Closed),
                Ok(0) => {
                    thread::sleep(self.eof_idle);
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<R> std::fmt::Debug for ReadTransport<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadTransport")
            .field("closed_on_eof", &self.closed_on_eof)
            .field("eof_idle", &self.eof_idle)
            .finish()
    }
}
