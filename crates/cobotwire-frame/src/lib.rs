//! Frame synchronization and payload decoding for serial robot controllers.
//!
//! Every frame on the wire looks like:
//! - A 2-byte header (`0xFE 0xFE`)
//! - A 1-byte length counting everything after it
//! - A 1-byte command code, echoed back by the controller
//! - The payload, then a reserved footer byte (`0xFA`)
//!
//! The controller also emits unsolicited chatter frames (`0xFF 0xFF`) that the
//! [`FrameReader`] skips. Payloads carry no type tag; the [`decoder`] picks an
//! interpretation from the payload length and the command that was sent.

pub mod codec;
pub mod command;
pub mod config;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod reader;
pub mod writer;

pub use codec::{
    angle_to_int, build_command_payload, coord_to_int, decode_int16, decode_int8, encode_int16,
    encode_int8, flatten, int_to_angle, int_to_coord, CommandArg, Nested,
};
pub use command::{command_name, Command, UnknownCommand, CHATTER_HEADER, FOOTER, HEADER};
pub use config::{ReaderConfig, WriterConfig, DEFAULT_PRE_READ_BYTES};
pub use decoder::{decode, decode_bytes, rule_for, unwrap_single, DecodeRule, DecodedValue, NO_VALUE};
pub use error::{FrameError, Result};
pub use frame::{encode_command, Frame, MAX_PAYLOAD};
pub use reader::FrameReader;
pub use writer::FrameWriter;
