/// Errors that can occur in transport operations.
///
/// A timeout is never an error: it is reported as a zero-length read.
/// Every variant here is fatal for whoever owns the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named device.
    #[error("failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source has been closed and will never produce more data.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// The underlying I/O error kind, if any.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
