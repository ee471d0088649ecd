use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{ReadTransport, Transport};
use crate::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};

/// Serial port settings. Always 8N1 with no flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Line rate in baud.
    pub baud_rate: u32,
    /// Maximum time a single read blocks before reporting no data.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Settings for `path` with default baud rate and timeout.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Open the raw port (readable and writable).
    pub fn open_port(&self) -> Result<Box<dyn SerialPort>> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(self.timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|err| TransportError::Open {
                path: self.path.clone(),
                message: err.to_string(),
            })?;

        info!(
            path = %self.path,
            baud_rate = self.baud_rate,
            timeout_ms = self.timeout.as_millis() as u64,
            "serial port opened"
        );
        Ok(port)
    }
}

/// A serial device as a [`Transport`].
pub struct SerialTransport {
    inner: ReadTransport<Box<dyn SerialPort>>,
    path: String,
}

impl SerialTransport {
    /// Open the port and discard whatever the device buffered before we
    /// started listening.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = config.open_port()?;
        if let Err(err) = port.clear(serialport::ClearBuffer::Input) {
            debug!(path = %config.path, error = %err, "could not purge stale input");
        }
        Ok(Self {
            inner: ReadTransport::new(port),
            path: config.path.clone(),
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish()
    }
}
