use clap::{Args, Subcommand};
use cobotwire_frame::{angle_to_int, coord_to_int, Command as ProtocolCommand, CommandArg};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;
use crate::parse::{parse_arg_list, parse_float_list};

pub mod commands;
pub mod decode;
pub mod encode;
#[cfg(feature = "serial")]
pub mod query;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find and decode frames in a captured byte stream.
    Decode(DecodeArgs),
    /// Encode a command frame.
    Encode(EncodeArgs),
    /// List the command code table.
    Commands(CommandsArgs),
    /// Send a command over a serial port and decode the response.
    #[cfg(feature = "serial")]
    Query(QueryArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        #[cfg(feature = "serial")]
        Command::Query(args) => query::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Command the frames answer (name or 0xNN). Default: each frame's own command byte.
    #[arg(long, short = 'c')]
    pub command: Option<ProtocolCommand>,
    /// Hex bytes, e.g. "FF FF 01 02 00 00 FE FE 03 12 01 FA".
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Raw binary capture file. Default: raw bytes from stdin.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Bytes to discard before each frame.
    #[arg(long, value_name = "N")]
    pub pre_read: Option<usize>,
    /// Also print angles and coordinates in degrees and millimetres.
    #[arg(long)]
    pub units: bool,
}

#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Payload items: bytes and bracketed int16 blocks, e.g. "1,[100,-200],50".
    #[arg(long, value_name = "LIST", allow_hyphen_values = true)]
    pub args: Option<String>,
    /// Joint angles in degrees, sent as one int16 block ahead of --args.
    #[arg(long, value_name = "DEG,...", allow_hyphen_values = true, conflicts_with = "coords")]
    pub angles: Option<String>,
    /// Coordinates x,y,z (mm) then rx,ry,rz (deg), sent as one int16 block ahead of --args.
    #[arg(long, value_name = "X,Y,Z,RX,RY,RZ", allow_hyphen_values = true)]
    pub coords: Option<String>,
}

impl PayloadArgs {
    /// Build the command arguments: the unit block first, then `--args`.
    pub fn to_command_args(&self) -> CliResult<Vec<CommandArg>> {
        let mut out = Vec::new();
        if let Some(angles) = &self.angles {
            let values = parse_float_list(angles)?;
            out.push(CommandArg::Block(values.into_iter().map(angle_to_int).collect()));
        }
        if let Some(coords) = &self.coords {
            let values = parse_float_list(coords)?;
            out.push(CommandArg::Block(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| if i < 3 { coord_to_int(v) } else { angle_to_int(v) })
                    .collect(),
            ));
        }
        if let Some(list) = &self.args {
            out.extend(parse_arg_list(list)?);
        }
        Ok(out)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name (e.g. SEND_ANGLES) or code (e.g. 0x22).
    pub command: ProtocolCommand,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

#[cfg(feature = "serial")]
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Serial device path (e.g. /dev/ttyUSB0, COM3).
    pub port: String,
    /// Command name or code.
    pub command: ProtocolCommand,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Baud rate.
    #[arg(long, default_value_t = cobotwire_transport::SerialTransport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Per-read timeout (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
    /// Bytes to discard before each frame.
    #[arg(long, value_name = "N")]
    pub pre_read: Option<usize>,
    /// Extra attempts when the response is missing or belongs to another command.
    #[arg(long, default_value_t = 2)]
    pub retries: u32,
    /// Send only; do not wait for a response.
    #[arg(long)]
    pub no_response: bool,
    /// Also print angles and coordinates in degrees and millimetres.
    #[arg(long)]
    pub units: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
