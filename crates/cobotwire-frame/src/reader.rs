use bytes::{BufMut, BytesMut};
use cobotwire_transport::Transport;
use tracing::{debug, trace, warn};

use crate::command::{CHATTER_HEADER, HEADER};
use crate::config::ReaderConfig;
use crate::decoder::{decode, DecodedValue};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, PREFIX_SIZE};

/// Where a read cycle currently stands.
#[derive(Debug)]
enum ScanState {
    /// Expecting a header at the read position.
    SeekingFrame,
    /// Saw `0xFF 0xFF <instruction>`; the length byte and body follow.
    ReadingChatter { instruction: u8 },
    FrameFound(Frame),
    ReadError(FrameError),
}

/// Reads complete protocol frames from a [`Transport`].
///
/// The controller interleaves unsolicited chatter frames (`0xFF 0xFF` header)
/// with its responses. Each [`read_frame`](Self::read_frame) call consumes any
/// number of chatter frames and returns the first real frame. A header that
/// matches neither marker is reported as [`FrameError::Desync`]; the reader
/// never guesses where the next frame starts.
pub struct FrameReader<T> {
    inner: T,
    config: ReaderConfig,
    skipped_bytes: u64,
    chatter_frames: u64,
}

impl<T: Transport> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            config,
            skipped_bytes: 0,
            chatter_frames: 0,
        }
    }

    /// Read the next real frame (blocking).
    ///
    /// Returns the raw frame bytes, header included. Fails with
    /// [`FrameError::IncompleteFrame`] if the transport runs dry mid-frame and
    /// with [`FrameError::Desync`] if the stream is not at a frame boundary.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let skipped_before = self.skipped_bytes;
        let mut state = match self.pre_read() {
            Ok(()) => ScanState::SeekingFrame,
            Err(err) => ScanState::ReadError(err),
        };

        loop {
            state = match state {
                ScanState::FrameFound(frame) => {
                    debug!(
                        skipped = self.skipped_bytes - skipped_before,
                        len = frame.wire_size(),
                        "frame read"
                    );
                    trace!(bytes = ?frame.as_bytes(), "frame");
                    return Ok(frame);
                }
                ScanState::ReadError(err) => return Err(err),
                pending => self.advance(pending).unwrap_or_else(ScanState::ReadError),
            };
        }
    }

    /// Read the next frame and decode it against the command that was sent.
    ///
    /// `Ok(None)` means a frame arrived but carries nothing for `expected`.
    pub fn read_decoded(&mut self, expected: impl Into<u8>) -> Result<Option<DecodedValue>> {
        let frame = self.read_frame()?;
        Ok(decode(&frame, expected))
    }

    fn advance(&mut self, state: ScanState) -> Result<ScanState> {
        match state {
            ScanState::SeekingFrame => self.seek(),
            ScanState::ReadingChatter { instruction } => self.skip_chatter(instruction),
            terminal => Ok(terminal),
        }
    }

    fn pre_read(&mut self) -> Result<()> {
        if let Some(count) = self.config.pre_read_bytes.filter(|&n| n > 0) {
            let discarded = self.inner.read_bytes(count)?;
            trace!(requested = count, discarded = discarded.len(), "pre-read");
            self.skipped_bytes += discarded.len() as u64;
        }
        Ok(())
    }

    fn seek(&mut self) -> Result<ScanState> {
        let prefix = self.inner.read_bytes(PREFIX_SIZE)?;
        match prefix.as_slice() {
            &[CHATTER_HEADER, CHATTER_HEADER, instruction] => {
                Ok(ScanState::ReadingChatter { instruction })
            }
            &[HEADER, HEADER, declared] => self.read_body(&prefix, usize::from(declared)),
            _ => {
                warn!(bytes = ?prefix, "bad frame header");
                Err(FrameError::Desync { bytes: prefix })
            }
        }
    }

    fn read_body(&mut self, prefix: &[u8], declared: usize) -> Result<ScanState> {
        let body = self.inner.read_bytes(declared)?;
        if body.len() < declared {
            debug!(declared, received = body.len(), "could not read frame body");
            return Err(FrameError::IncompleteFrame {
                expected: declared,
                received: body.len(),
            });
        }

        let mut raw = BytesMut::with_capacity(prefix.len() + body.len());
        raw.put_slice(prefix);
        raw.put_slice(&body);
        Ok(ScanState::FrameFound(Frame::from_parts(raw.freeze())))
    }

    fn skip_chatter(&mut self, instruction: u8) -> Result<ScanState> {
        let len = self.inner.read_bytes(1)?;
        let Some(&len) = len.first() else {
            return Err(FrameError::IncompleteFrame {
                expected: 1,
                received: 0,
            });
        };

        let declared = usize::from(len);
        let body = self.inner.read_bytes(declared)?;
        if body.len() < declared {
            return Err(FrameError::IncompleteFrame {
                expected: declared,
                received: body.len(),
            });
        }

        self.skipped_bytes += (PREFIX_SIZE + 1 + declared) as u64;
        self.chatter_frames += 1;
        trace!(instruction, len = declared, "skipped chatter frame");
        Ok(ScanState::SeekingFrame)
    }

    /// Total bytes discarded as chatter or pre-read since creation.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Total chatter frames discarded since creation.
    pub fn chatter_frames(&self) -> u64 {
        self.chatter_frames
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the pre-read size for subsequent reads.
    pub fn set_pre_read_bytes(&mut self, pre_read_bytes: Option<usize>) {
        self.config.pre_read_bytes = pre_read_bytes;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}
