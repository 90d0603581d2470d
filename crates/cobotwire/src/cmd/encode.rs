use std::io::Cursor;

use cobotwire_frame::FrameWriter;
use cobotwire_transport::StreamTransport;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = encode(&args)?;
    print_encoded(args.command, &frame, format);
    Ok(SUCCESS)
}

fn encode(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    let command_args = args.payload.to_command_args()?;
    let mut writer = FrameWriter::new(StreamTransport::new(Cursor::new(Vec::new())));
    writer
        .send(args.command, &command_args)
        .map_err(|err| frame_error("encode failed", err))?;
    Ok(writer.into_inner().into_inner().into_inner())
}
