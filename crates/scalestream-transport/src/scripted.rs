//! Deterministic in-memory transport.
//!
//! Each [`Step`] is consumed in order. A data step may be drained across
//! several reads when the caller asks for fewer bytes than it holds.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// One scripted transport reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Bytes that become available, possibly over several reads.
    Data(Vec<u8>),
    /// One empty read (a timeout window with no data).
    Timeout,
    /// An unrecoverable I/O failure of the given kind.
    Fatal(ErrorKind),
}

/// A [`Transport`] that replays a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    closed_when_exhausted: bool,
    idle_delay: Option<Duration>,
    reads: usize,
}

impl ScriptedTransport {
    /// Create a transport from a list of steps.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Create a transport that yields `bytes` and then only timeouts.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new([Step::Data(bytes.into())])
    }

    /// Report [`TransportError::Closed`] once the script runs out,
    /// instead of timing out forever.
    pub fn closed_when_exhausted(mut self) -> Self {
        self.closed_when_exhausted = true;
        self
    }

    /// Sleep for `delay` on every empty read, like a real timeout would.
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = Some(delay);
        self
    }

    /// Append a step to the end of the script.
    pub fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Number of `read` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn idle(&self) -> Result<usize> {
        if let Some(delay) = self.idle_delay {
            std::thread::sleep(delay);
        }
        Ok(0)
    }
}

impl Transport for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reads += 1;
        if buf.is_empty() {
            return Ok(0);
        }

        match self.steps.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    bytes.drain(..n);
                    self.steps.push_front(Step::Data(bytes));
                }
                Ok(n)
            }
            Some(Step::Timeout) => self.idle(),
            Some(Step::Fatal(kind)) => Err(TransportError::Io(kind.into())),
            None if self.closed_when_exhausted => Err(TransportError::Closed),
            None => self.idle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_drained_across_short_reads() {
        let mut transport = ScriptedTransport::from_bytes(b"hello".to_vec());
        let mut buf = [0u8; 2];

        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"he");
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ll");
        assert_eq!(transport.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'o');
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn data_step_never_merges_with_the_next() {
        let mut transport =
            ScriptedTransport::new([Step::Data(b"a".to_vec()), Step::Data(b"b".to_vec())]);
        let mut buf = [0u8; 4];

        assert_eq!(transport.read(&mut buf).unwrap(), 1);
        assert_eq!(transport.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'b');
    }

    #[test]
    fn timeout_and_fatal_steps() {
        let mut transport =
            ScriptedTransport::new([Step::Timeout, Step::Fatal(ErrorKind::NotConnected)]);
        let mut buf = [0u8; 1];

        assert_eq!(transport.read(&mut buf).unwrap(), 0);
        let err = transport.read(&mut buf).unwrap_err();
        assert_eq!(err.io_kind(), Some(ErrorKind::NotConnected));
        assert_eq!(transport.reads(), 2);
    }

    #[test]
    fn exhausted_script_closes_when_requested() {
        let mut transport = ScriptedTransport::new([]).closed_when_exhausted();
        let mut buf = [0u8; 1];
        assert!(matches!(
            transport.read(&mut buf),
            Err(TransportError::Closed)
        ));
    }
}
