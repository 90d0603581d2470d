use cobotwire_frame::{
    decode, Command, CommandArg, DecodedValue, Frame, FrameError, FrameReader, FrameWriter,
    ReaderConfig,
};
use cobotwire_transport::{SerialTransport, Transport};
use tracing::{debug, warn};

use crate::cmd::QueryArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_frames, FrameRecord, OutputFormat};
use crate::parse::parse_duration;

pub fn run(args: QueryArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let command_args = args.payload.to_command_args()?;
    let mut port = SerialTransport::open_with_timeout(args.port.as_str(), args.baud, timeout)
        .map_err(|err| transport_error("open failed", err))?;
    port.clear().map_err(|err| transport_error("clear failed", err))?;

    if args.no_response {
        FrameWriter::new(&mut port)
            .send(args.command, &command_args)
            .map_err(|err| frame_error("send failed", err))?;
        return Ok(SUCCESS);
    }

    let config = ReaderConfig {
        pre_read_bytes: args.pre_read,
    };
    let (frame, value) = exchange(&mut port, args.command, &command_args, config, args.retries)?
        .ok_or_else(|| {
            CliError::new(
                TIMEOUT,
                format!(
                    "no {} response from {} after {} attempts",
                    args.command,
                    port.path(),
                    args.retries + 1
                ),
            )
        })?;

    let record = FrameRecord::new(0, &frame, args.command.code(), value.as_ref(), args.units);
    print_frames(&[record], format);
    Ok(SUCCESS)
}

/// Send `command` and wait for the frame that answers it.
///
/// Each attempt resends the command. Frames for other commands, timeouts
/// and desyncs use up an attempt; transport failures end the exchange.
fn exchange<T: Transport>(
    transport: &mut T,
    command: Command,
    args: &[CommandArg],
    config: ReaderConfig,
    retries: u32,
) -> CliResult<Option<(Frame, Option<DecodedValue>)>> {
    for attempt in 0..=retries {
        FrameWriter::new(&mut *transport)
            .send(command, args)
            .map_err(|err| frame_error("send failed", err))?;

        let mut reader = FrameReader::with_config(&mut *transport, config);
        match reader.read_frame() {
            Ok(frame) if frame.command() == Some(command.code()) => {
                let value = decode(&frame, command);
                return Ok(Some((frame, value)));
            }
            Ok(frame) => {
                debug!(attempt, received = ?frame.command(), "response for another command");
            }
            Err(err @ (FrameError::Desync { .. } | FrameError::IncompleteFrame { .. })) => {
                warn!(attempt, error = %err, "no usable response");
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Answers each write with the next scripted response.
    struct Scripted {
        responses: VecDeque<Vec<u8>>,
        inbound: VecDeque<u8>,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(responses: Vec<Vec<u8>>) -> Self {
            Self {
                responses: responses.into(),
                inbound: VecDeque::new(),
                written: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn read_bytes(&mut self, n: usize) -> cobotwire_transport::Result<Vec<u8>> {
            let n = n.min(self.inbound.len());
            Ok(self.inbound.drain(..n).collect())
        }

        fn write_bytes(&mut self, data: &[u8]) -> cobotwire_transport::Result<()> {
            self.written.extend_from_slice(data);
            if let Some(next) = self.responses.pop_front() {
                self.inbound.extend(next);
            }
            Ok(())
        }

        fn pending_outbound(&mut self) -> cobotwire_transport::Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn first_matching_response_wins() {
        let mut port = Scripted::new(vec![vec![
            0xFF, 0xFF, 0x01, 0x02, 0x00, 0x00, // chatter
            0xFE, 0xFE, 0x04, 0x40, 0x00, 0x32, 0xFA,
        ]]);
        let (frame, value) = exchange(&mut port, Command::GetSpeed, &[], ReaderConfig::default(), 2)
            .unwrap()
            .expect("response expected");
        assert_eq!(frame.command(), Some(0x40));
        assert_eq!(value, Some(DecodedValue::Int16(50)));
        assert_eq!(port.written, vec![0xFE, 0xFE, 0x02, 0x40, 0xFA]);
    }

    #[test]
    fn retries_after_silence_and_mismatch() {
        let mut port = Scripted::new(vec![
            vec![],
            vec![0xFE, 0xFE, 0x03, 0x12, 0x01, 0xFA],
            vec![0xFE, 0xFE, 0x03, 0x2B, 0x01, 0xFA],
        ]);
        let (_, value) = exchange(&mut port, Command::IsMoving, &[], ReaderConfig::default(), 2)
            .unwrap()
            .expect("third attempt answers");
        assert_eq!(value, Some(DecodedValue::Int8(1)));
        assert_eq!(port.written.len(), 15);
    }

    #[test]
    fn gives_up_after_retries() {
        let mut port = Scripted::new(vec![]);
        let result =
            exchange(&mut port, Command::GetAngles, &[], ReaderConfig::default(), 1).unwrap();
        assert!(result.is_none());
        assert_eq!(port.written.len(), 10);
    }

    #[test]
    fn send_errors_are_not_retried() {
        let mut port = Scripted::new(vec![]);
        let err = exchange(
            &mut port,
            Command::SendAngles,
            &[CommandArg::Block(vec![40_000])],
            ReaderConfig::default(),
            3,
        )
        .unwrap_err();
        assert_eq!(err.code, crate::exit::DATA_INVALID);
        assert!(port.written.is_empty());
    }
}
