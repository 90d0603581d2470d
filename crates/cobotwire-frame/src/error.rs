use cobotwire_transport::TransportError;

/// Errors that can occur while encoding commands or reading frames.
///
/// A response that belongs to a different command is not an error: decoding
/// yields `None` for it so a polling caller can simply read again.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A value does not fit the fixed-width integer it must be encoded as.
    #[error("value {value} out of range for {width} (expected {min}..={max})")]
    OutOfRange {
        value: i64,
        width: &'static str,
        min: i64,
        max: i64,
    },

    /// A fixed-width decode was handed the wrong number of bytes.
    #[error("expected {expected} bytes to decode, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The command payload does not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The transport ran dry (timeout or EOF) before the declared length arrived.
    #[error("incomplete frame: expected {expected} bytes, received {received}")]
    IncompleteFrame { expected: usize, received: usize },

    /// The bytes at the read position match neither the frame nor the chatter header.
    #[error("frame desynchronized: unexpected header bytes {bytes:02X?}")]
    Desync { bytes: Vec<u8> },

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
