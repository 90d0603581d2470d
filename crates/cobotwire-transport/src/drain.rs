use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Default interval between outbound-buffer polls.
pub const DEFAULT_DRAIN_POLL: Duration = Duration::from_millis(5);

/// Write `data` and block until the transport reports an empty outbound queue.
///
/// The queue is polled every `poll` with `thread::sleep` in between, so other
/// threads keep running while a slow UART drains. With `timeout` set, a queue
/// that is still non-empty after that long fails with
/// [`TransportError::DrainTimeout`].
pub fn write_and_drain<T: Transport + ?Sized>(
    transport: &mut T,
    data: &[u8],
    poll: Duration,
    timeout: Option<Duration>,
) -> Result<()> {
    trace!(len = data.len(), bytes = ?data, "write");
    transport.write_bytes(data)?;

    let start = Instant::now();
    loop {
        let pending = transport.pending_outbound()?;
        if pending == 0 {
            return Ok(());
        }
        let elapsed = start.elapsed();
        if let Some(limit) = timeout {
            if elapsed >= limit {
                debug!(pending, ?elapsed, "outbound drain timed out");
                return Err(TransportError::DrainTimeout { elapsed, pending });
            }
        }
        std::thread::sleep(poll);
    }
}
