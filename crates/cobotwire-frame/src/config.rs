use std::time::Duration;

use cobotwire_transport::DEFAULT_DRAIN_POLL;

/// Pre-read size that clears one burst of controller chatter in one go.
pub const DEFAULT_PRE_READ_BYTES: usize = 96;

/// Controls how a [`crate::FrameReader`] consumes the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderConfig {
    /// Bytes to read and discard before seeking each frame.
    ///
    /// Only safe when the device is known to emit at least this much chatter
    /// ahead of every response; otherwise the response itself is swallowed.
    pub pre_read_bytes: Option<usize>,
}

/// Controls how a [`crate::FrameWriter`] waits for outbound bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Sleep between outbound-queue polls.
    pub drain_poll: Duration,
    /// Give up waiting for the queue to drain after this long.
    pub drain_timeout: Option<Duration>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            drain_poll: DEFAULT_DRAIN_POLL,
            drain_timeout: Some(Duration::from_secs(1)),
        }
    }
}
