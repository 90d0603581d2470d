use std::time::Duration;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to open or configure a serial port.
    #[cfg(feature = "serial")]
    #[error("serial port error on {path}: {source}")]
    Serial {
        path: String,
        source: serialport::Error,
    },

    /// The outbound buffer did not drain within the allowed time.
    #[error("outbound buffer not drained after {elapsed:?} ({pending} bytes pending)")]
    DrainTimeout { elapsed: Duration, pending: usize },

    /// The peer stopped accepting bytes.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
