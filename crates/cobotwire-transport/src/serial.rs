use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{StreamTransport, Transport};

/// Serial port transport.
///
/// Reads honor the port timeout: a read that times out returns the bytes
/// received so far. Writes never call `flush`, which would block until the
/// line drains. `pending_outbound` reports the OS transmit queue instead, and
/// [`crate::write_and_drain`] polls it against its deadline.
pub struct SerialTransport {
    path: String,
    port: StreamTransport<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Default baud rate of the controller firmware.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    /// Default per-read timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Open `path` at `baud_rate` with the default timeout.
    pub fn open(path: impl Into<String>, baud_rate: u32) -> Result<Self> {
        Self::open_with_timeout(path, baud_rate, Self::DEFAULT_TIMEOUT)
    }

    /// Open `path` at `baud_rate` with an explicit read/write timeout.
    pub fn open_with_timeout(
        path: impl Into<String>,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let path = path.into();
        let port = serialport::new(path.as_str(), baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| TransportError::Serial {
                path: path.clone(),
                source,
            })?;
        info!(%path, baud_rate, ?timeout, "serial port opened");
        Ok(Self {
            path,
            port: StreamTransport::without_flush(port),
        })
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        let path = port.name().unwrap_or_else(|| "<unnamed>".to_string());
        Self {
            path,
            port: StreamTransport::without_flush(port),
        }
    }

    /// The device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Change the per-read timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        debug!(path = %self.path, ?timeout, "setting serial timeout");
        self.port
            .get_mut()
            .set_timeout(timeout)
            .map_err(|source| self.serial_error(source))
    }

    /// Discard anything buffered in either direction.
    pub fn clear(&mut self) -> Result<()> {
        self.port
            .get_mut()
            .clear(serialport::ClearBuffer::All)
            .map_err(|source| self.serial_error(source))
    }

    fn serial_error(&self, source: serialport::Error) -> TransportError {
        TransportError::Serial {
            path: self.path.clone(),
            source,
        }
    }
}

impl Transport for SerialTransport {
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.port.read_bytes(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_bytes(data)
    }

    fn pending_outbound(&mut self) -> Result<usize> {
        let queued = self
            .port
            .get_mut()
            .bytes_to_write()
            .map_err(|source| self.serial_error(source))?;
        Ok(queued as usize)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish()
    }
}
