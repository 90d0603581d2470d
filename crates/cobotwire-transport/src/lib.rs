//! Blocking byte transport abstraction.
//!
//! This is the lowest layer of cobotwire. The frame layer only ever talks to a
//! [`Transport`]: read exactly `n` bytes (or fewer on timeout/EOF), write a
//! buffer, and report how many outbound bytes are still queued.
//!
//! Two implementations are provided:
//! - [`StreamTransport`] over any `Read + Write` (pipes, sockets, test buffers)
//! - `SerialTransport` over a serial port (behind the `serial` feature)

pub mod drain;
pub mod error;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use drain::{write_and_drain, DEFAULT_DRAIN_POLL};
pub use error::{Result, TransportError};
pub use traits::{StreamTransport, Transport};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
