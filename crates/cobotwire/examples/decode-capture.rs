//! Decode a captured controller session.
//!
//! Run with:
//!   cargo run --example decode-capture -- capture.bin GET_ANGLES
//!
//! Without arguments a built-in capture is used: two chatter frames followed
//! by a GET_ANGLES response.

use std::io::Cursor;

use cobotwire::frame::{int_to_angle, Command, FrameError, FrameReader};
use cobotwire::transport::StreamTransport;

const SAMPLE: &[u8] = &[
    0xFF, 0xFF, 0x01, 0x02, 0x00, 0x00, // chatter
    0xFF, 0xFF, 0x07, 0x01, 0x10, // chatter
    0xFE, 0xFE, 0x0E, 0x20, // GET_ANGLES response
    0x00, 0x00, 0x23, 0x28, 0xDC, 0xD8, 0x11, 0x94, 0xEE, 0x6C, 0x00, 0x64, //
    0xFA,
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let data = match argv.next() {
        Some(path) => std::fs::read(path)?,
        None => SAMPLE.to_vec(),
    };
    let command: Command = match argv.next() {
        Some(name) => name.parse()?,
        None => Command::GetAngles,
    };

    let mut reader = FrameReader::new(StreamTransport::new(Cursor::new(data)));
    loop {
        match reader.read_decoded(command) {
            Ok(Some(value)) => {
                let degrees: Vec<f64> = value.to_vec().into_iter().map(int_to_angle).collect();
                eprintln!("{command}: {:?} (as degrees: {degrees:?})", value.to_vec());
            }
            Ok(None) => eprintln!("frame for another command"),
            Err(FrameError::Desync { bytes }) if bytes.is_empty() => break,
            Err(e) => {
                eprintln!("stopped: {e}");
                break;
            }
        }
    }

    eprintln!(
        "skipped {} chatter frames ({} bytes)",
        reader.chatter_frames(),
        reader.skipped_bytes()
    );
    Ok(())
}
