use std::io::{ErrorKind, Read, Write};

use tracing::trace;

use crate::error::{Result, TransportError};

/// A blocking, half-duplex byte transport.
///
/// Implementations block until the request is satisfied or the underlying
/// device times out. A short read is never an error at this layer: the frame
/// layer decides what a missing byte means.
pub trait Transport {
    /// Read up to `n` bytes, blocking until all `n` arrive.
    ///
    /// Returns fewer than `n` bytes only on timeout or end of stream.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Write all of `data`, blocking until the transport has accepted it.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Number of bytes still queued for transmission.
    fn pending_outbound(&mut self) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_bytes(data)
    }

    fn pending_outbound(&mut self) -> Result<usize> {
        (**self).pending_outbound()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_bytes(data)
    }

    fn pending_outbound(&mut self) -> Result<usize> {
        (**self).pending_outbound()
    }
}

/// Adapts any `Read + Write` stream into a [`Transport`].
///
/// Read timeouts configured on the stream itself (`TimedOut` / `WouldBlock`)
/// end a read early with whatever bytes have arrived. Streams built with
/// [`new`](Self::new) are flushed after every write. Streams built with
/// [`without_flush`](Self::without_flush) are not: `flush` on a serial port
/// blocks until the line drains, with no deadline, so devices that report
/// their transmit queue leave the wait to [`crate::write_and_drain`].
#[derive(Debug)]
pub struct StreamTransport<T> {
    inner: T,
    flush_writes: bool,
}

impl<T> StreamTransport<T> {
    /// Wrap a stream, flushing after every write.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            flush_writes: true,
        }
    }

    /// Wrap a stream without ever calling `flush`.
    pub fn without_flush(inner: T) -> Self {
        Self {
            inner,
            flush_writes: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> Transport for StreamTransport<T> {
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0usize;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    trace!(requested = n, received = filled, "read timed out");
                    break;
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        if !self.flush_writes {
            return Ok(());
        }
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn pending_outbound(&mut self) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_exact_count() {
        let mut t = StreamTransport::new(Cursor::new(vec![1, 2, 3, 4, 5]));
        assert_eq!(t.read_bytes(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(t.read_bytes(2).unwrap(), vec![4, 5]);
    }

    #[test]
    fn short_read_at_eof() {
        let mut t = StreamTransport::new(Cursor::new(vec![9, 8]));
        assert_eq!(t.read_bytes(4).unwrap(), vec![9, 8]);
        assert!(t.read_bytes(1).unwrap().is_empty());
    }

    #[test]
    fn zero_length_read_is_empty() {
        let mut t = StreamTransport::new(Cursor::new(vec![1]));
        assert!(t.read_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn byte_by_byte_stream_is_reassembled() {
        let mut t = StreamTransport::new(Trickle {
            bytes: vec![0xFE, 0xFE, 0x02, 0x00],
            pos: 0,
            interrupted: false,
        });
        assert_eq!(t.read_bytes(4).unwrap(), vec![0xFE, 0xFE, 0x02, 0x00]);
    }

    #[test]
    fn timeout_ends_read_early() {
        let mut t = StreamTransport::new(TimesOut { sent: false });
        assert_eq!(t.read_bytes(3).unwrap(), vec![0x42]);
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut t = StreamTransport::new(Broken);
        let err = t.read_bytes(1).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn write_then_nothing_pending() {
        let mut t = StreamTransport::new(Cursor::new(Vec::<u8>::new()));
        t.write_bytes(&[0xFE, 0xFE, 0x02, 0x20, 0xFA]).unwrap();
        assert_eq!(t.pending_outbound().unwrap(), 0);
        assert_eq!(
            t.into_inner().into_inner(),
            vec![0xFE, 0xFE, 0x02, 0x20, 0xFA]
        );
    }

    #[test]
    fn zero_write_means_closed() {
        let mut t = StreamTransport::new(Broken);
        let err = t.write_bytes(&[1]).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn without_flush_never_blocks_on_flush() {
        let mut t = StreamTransport::without_flush(BlockingFlush::default());
        t.write_bytes(&[0xFE, 0xFE, 0x02, 0x29, 0xFA]).unwrap();
        let inner = t.into_inner();
        assert_eq!(inner.written, vec![0xFE, 0xFE, 0x02, 0x29, 0xFA]);
        assert_eq!(inner.flushes, 0);

        let mut t = StreamTransport::new(BlockingFlush::default());
        t.write_bytes(&[0x01]).unwrap();
        assert_eq!(t.get_ref().flushes, 1);
    }

    #[test]
    fn transport_through_mut_ref() {
        let mut inner = StreamTransport::new(Cursor::new(vec![7u8]));
        let borrowed: &mut dyn Transport = &mut inner;
        assert_eq!(borrowed.read_bytes(1).unwrap(), vec![7]);
    }

    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct TimesOut {
        sent: bool,
    }

    impl Read for TimesOut {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.sent {
                self.sent = true;
                buf[0] = 0x42;
                return Ok(1);
            }
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }

    impl Write for TimesOut {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Stands in for a serial port whose `flush` waits for the line to drain.
    #[derive(Default)]
    pub(crate) struct BlockingFlush {
        pub(crate) written: Vec<u8>,
        pub(crate) flushes: usize,
    }

    impl Read for BlockingFlush {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for BlockingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            std::thread::sleep(std::time::Duration::from_millis(300));
            Ok(())
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
