//! Timeout-tolerant byte transport abstraction.
//!
//! Provides a unified interface over byte sources that block for a bounded
//! time and report "nothing arrived" as an empty read:
//! - Any [`std::io::Read`] (serial devices, sockets, capture files)
//! - Serial ports opened by path (behind the `serial` feature)
//! - A scripted in-memory source for deterministic tests and replays
//!
//! This is the lowest layer of scalestream. Everything else builds on top of
//! the [`Transport`] trait provided here.

use std::time::Duration;

pub mod error;
pub mod scripted;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use scripted::{ScriptedTransport, Step};
pub use traits::{ReadTransport, Transport, DEFAULT_EOF_IDLE};

/// Default line rate for scale boards.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default per-read timeout window.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};
