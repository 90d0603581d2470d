//! Wire protocol for serial-connected robot arm controllers.
//!
//! cobotwire turns typed command arguments into framed bytes and framed bytes
//! from the controller back into typed values, skipping the unsolicited
//! chatter the controller interleaves with its responses.
//!
//! # Crate Structure
//!
//! - [`transport`]: Blocking byte transport (streams, serial ports behind `serial`)
//! - [`frame`]: Codec, frame reader/writer and command-aware decoding

/// Re-export transport types.
pub mod transport {
    pub use cobotwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cobotwire_frame::*;
}
