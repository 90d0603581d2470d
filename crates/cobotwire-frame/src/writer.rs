use bytes::BytesMut;
use cobotwire_transport::{write_and_drain, Transport};
use tracing::debug;

use crate::codec::{build_command_payload, CommandArg};
use crate::config::WriterConfig;
use crate::error::Result;
use crate::frame::{encode_command, Frame};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Frames commands and writes them to a [`Transport`].
///
/// Every send blocks until the transport's outbound queue is empty, so a
/// response read right afterwards cannot race the tail of the request.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: WriterConfig,
}

impl<T: Transport> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: WriterConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode `args` and send them as `command`.
    pub fn send(&mut self, command: impl Into<u8>, args: &[CommandArg]) -> Result<()> {
        let payload = build_command_payload(args)?;
        self.send_payload(command, &payload)
    }

    /// Send an already encoded payload as `command`.
    pub fn send_payload(&mut self, command: impl Into<u8>, payload: &[u8]) -> Result<()> {
        let command = command.into();
        self.buf.clear();
        encode_command(command, payload, &mut self.buf)?;
        debug!(
            command = format_args!("0x{command:02X}"),
            len = self.buf.len(),
            "sending command"
        );
        self.flush_buf()
    }

    /// Write a complete frame as-is.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(frame.as_bytes());
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<()> {
        write_and_drain(
            &mut self.inner,
            &self.buf,
            self.config.drain_poll,
            self.config.drain_timeout,
        )?;
        Ok(())
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}
