use std::fs;
use std::io::{Cursor, Read};

use cobotwire_frame::{decode, FrameError, FrameReader, ReaderConfig};
use cobotwire_transport::StreamTransport;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frames, print_summary, FrameRecord, OutputFormat, StreamSummary};
use crate::parse::parse_hex;

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let data = read_input(&args)?;
    let config = ReaderConfig {
        pre_read_bytes: args.pre_read,
    };
    let expected = args.command.map(u8::from);

    let input_len = data.len();
    let (records, summary) = scan(data, config, expected, args.units)?;
    print_frames(&records, format);
    print_summary(&summary, format);

    if summary.frames == 0 && input_len > 0 {
        tracing::warn!(bytes = input_len, "no frames found in input");
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut data = Vec::new();
    std::io::stdin()
        .read_to_end(&mut data)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(data)
}

/// Read every frame in `data`.
///
/// Frames are decoded against `expected`, or against their own command byte
/// when none is given. A desync drops one byte and resumes, so frames after
/// line noise are still found.
fn scan(
    data: Vec<u8>,
    config: ReaderConfig,
    expected: Option<u8>,
    units: bool,
) -> CliResult<(Vec<FrameRecord>, StreamSummary)> {
    let mut reader = FrameReader::with_config(StreamTransport::new(Cursor::new(data)), config);
    let mut records = Vec::new();
    let mut summary = StreamSummary::default();
    let mut resync_bytes = 0u64;

    loop {
        match reader.read_frame() {
            Ok(frame) => {
                let decode_as = expected.or(frame.command()).unwrap_or_default();
                let value = decode(&frame, decode_as);
                if value.is_some() {
                    summary.decoded += 1;
                }
                records.push(FrameRecord::new(
                    records.len(),
                    &frame,
                    decode_as,
                    value.as_ref(),
                    units,
                ));
            }
            Err(FrameError::Desync { bytes }) if bytes.is_empty() => break,
            Err(FrameError::Desync { bytes }) => {
                summary.desyncs += 1;
                resync_bytes += 1;
                let cursor = reader.get_mut().get_mut();
                let rewind = (bytes.len() - 1) as u64;
                cursor.set_position(cursor.position().saturating_sub(rewind));
            }
            Err(FrameError::IncompleteFrame { expected, received }) => {
                tracing::warn!(expected, received, "input ends inside a frame");
                summary.truncated = true;
                break;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }

    summary.frames = records.len();
    summary.chatter_frames = reader.chatter_frames();
    summary.skipped_bytes = reader.skipped_bytes() + resync_bytes;
    Ok((records, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(data: &[u8]) -> (Vec<FrameRecord>, StreamSummary) {
        scan(data.to_vec(), ReaderConfig::default(), None, false).unwrap()
    }

    #[test]
    fn chatter_then_response() {
        let (records, summary) = scan_all(&[
            0xFF, 0xFF, 0x01, 0x02, 0x00, 0x00, // chatter
            0xFE, 0xFE, 0x03, 0x12, 0x01, 0xFA,
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command_name, "IS_POWER_ON");
        assert_eq!(records[0].values, Some(vec![1]));
        assert_eq!(summary.chatter_frames, 1);
        assert_eq!(summary.skipped_bytes, 6);
        assert_eq!(summary.desyncs, 0);
        assert!(!summary.truncated);
    }

    #[test]
    fn resyncs_after_noise() {
        let (records, summary) = scan_all(&[
            0x00, 0x13, // noise
            0xFE, 0xFE, 0x04, 0x40, 0x00, 0x32, 0xFA, //
            0xFE, 0xFE, 0x03, 0x2B, 0x00, 0xFA,
        ]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values, Some(vec![50]));
        assert_eq!(records[1].command_name, "IS_MOVING");
        assert_eq!(summary.desyncs, 2);
        assert_eq!(summary.skipped_bytes, 2);
    }

    #[test]
    fn truncated_tail_is_reported() {
        let (records, summary) = scan_all(&[
            0xFE, 0xFE, 0x03, 0x12, 0x01, 0xFA, //
            0xFE, 0xFE, 0x0E, 0x20, 0x00,
        ]);
        assert_eq!(records.len(), 1);
        assert!(summary.truncated);
    }

    #[test]
    fn expected_command_filters_values() {
        let data = vec![0xFEu8, 0xFE, 0x04, 0x40, 0x00, 0x32, 0xFA];
        let (records, summary) =
            scan(data, ReaderConfig::default(), Some(0x20), false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values, None);
        assert_eq!(summary.decoded, 0);
    }

    #[test]
    fn units_for_angles() {
        let data = vec![
            0xFEu8, 0xFE, 0x0E, 0x20, //
            0x23, 0x28, 0xDC, 0xD8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, //
            0xFA,
        ];
        let (records, _) = scan(data, ReaderConfig::default(), None, true).unwrap();
        assert_eq!(
            records[0].units,
            Some(vec![90.0, -90.0, 0.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn empty_input_has_no_frames() {
        let (records, summary) = scan_all(&[]);
        assert!(records.is_empty());
        assert_eq!(summary.desyncs, 0);
        assert!(!summary.truncated);
    }
}
