use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use cobotwire_frame::{
    command_name, int_to_angle, int_to_coord, rule_for, Command, DecodeRule, DecodedValue, Frame,
};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded frame.
#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub command: u8,
    pub command_name: &'static str,
    pub decoded_as: u8,
    pub kind: Option<&'static str>,
    pub values: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<f64>>,
    pub footer_ok: bool,
    pub raw: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl FrameRecord {
    pub fn new(
        index: usize,
        frame: &Frame,
        decoded_as: u8,
        value: Option<&DecodedValue>,
        with_units: bool,
    ) -> Self {
        let values = value.map(DecodedValue::to_vec);
        let units = values
            .as_deref()
            .filter(|_| with_units)
            .and_then(|v| physical_units(decoded_as, v));
        let command = frame.command().unwrap_or(decoded_as);
        Self {
            index,
            command,
            command_name: command_name(command),
            decoded_as,
            kind: value.map(value_kind),
            values,
            units,
            footer_ok: frame.has_footer(),
            raw: to_hex(frame.as_bytes()),
            bytes: frame.as_bytes().to_vec(),
        }
    }
}

/// Totals for one decode run.
#[derive(Debug, Default, Serialize)]
pub struct StreamSummary {
    pub frames: usize,
    pub decoded: usize,
    pub chatter_frames: u64,
    pub skipped_bytes: u64,
    pub desyncs: usize,
    pub truncated: bool,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    command: u8,
    command_name: &'a str,
    payload_size: usize,
    frame: String,
}

#[derive(Serialize)]
struct CommandRow {
    code: u8,
    name: &'static str,
    special_rule: Option<String>,
}

pub fn print_frames(records: &[FrameRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!("{}", to_json(record));
            }
        }
        OutputFormat::Table => {
            if records.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "COMMAND", "KIND", "VALUES", "FRAME"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    format!("{} (0x{:02X})", record.command_name, record.command),
                    record.kind.unwrap_or("-").to_string(),
                    values_cell(record),
                    record.raw.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "frame={} command={} (0x{:02X}) kind={} values={} footer_ok={} raw={}",
                    record.index,
                    record.command_name,
                    record.command,
                    record.kind.unwrap_or("none"),
                    values_cell(record),
                    record.footer_ok,
                    record.raw
                );
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_raw(&record.bytes);
            }
        }
    }
}

pub fn print_summary(summary: &StreamSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(summary)),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "frames={} decoded={} chatter_frames={} skipped_bytes={} desyncs={} truncated={}",
            summary.frames,
            summary.decoded,
            summary.chatter_frames,
            summary.skipped_bytes,
            summary.desyncs,
            summary.truncated
        ),
        OutputFormat::Raw => {}
    }
}

pub fn print_encoded(command: Command, frame: &[u8], format: OutputFormat) {
    let payload_size = frame.len().saturating_sub(5);
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                command: command.code(),
                command_name: command.name(),
                payload_size,
                frame: to_hex(frame),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "PAYLOAD", "FRAME"])
                .add_row(vec![
                    format!("{} (0x{:02X})", command.name(), command.code()),
                    payload_size.to_string(),
                    to_hex(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_commands(format: OutputFormat) {
    let rows: Vec<CommandRow> = Command::ALL
        .iter()
        .map(|&cmd| CommandRow {
            code: cmd.code(),
            name: cmd.name(),
            special_rule: special_rule(cmd),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            for row in &rows {
                println!("{}", to_json(row));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "NAME", "SPECIAL RULE"]);
            for row in &rows {
                table.add_row(vec![
                    format!("0x{:02X}", row.code),
                    row.name.to_string(),
                    row.special_rule.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                match &row.special_rule {
                    Some(rule) => println!("0x{:02X} {} ({rule})", row.code, row.name),
                    None => println!("0x{:02X} {}", row.code, row.name),
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space separated uppercase hex, e.g. `FE FE 02 20 FA`.
pub fn to_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Degrees and millimetres for the commands whose values are scaled integers.
pub fn physical_units(command: u8, values: &[i32]) -> Option<Vec<f64>> {
    let command = Command::try_from(command).ok()?;
    match command {
        Command::GetAngles | Command::GetJointMinAngle | Command::GetJointMaxAngle => {
            Some(values.iter().copied().map(int_to_angle).collect())
        }
        Command::GetCoords => Some(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| if i < 3 { int_to_coord(v) } else { int_to_angle(v) })
                .collect(),
        ),
        _ => None,
    }
}

fn special_rule(cmd: Command) -> Option<String> {
    let defaults = [1usize, 2, 8, 12];
    let overrides: Vec<String> = defaults
        .iter()
        .filter_map(|&len| {
            let rule = rule_for(cmd.code(), len);
            (rule != rule_for(0xFF, len)).then(|| format!("{len}-byte body: {}", rule_label(rule)))
        })
        .collect();
    (!overrides.is_empty()).then(|| overrides.join(", "))
}

fn rule_label(rule: DecodeRule) -> String {
    match rule {
        DecodeRule::Int16List => "int16 list".to_string(),
        DecodeRule::Int16 => "int16".to_string(),
        DecodeRule::Int8At(offset) => format!("int8 at byte {offset}"),
    }
}

fn value_kind(value: &DecodedValue) -> &'static str {
    match value {
        DecodedValue::Int16List(_) => "int16_list",
        DecodedValue::Int16(_) => "int16",
        DecodedValue::Int8(_) => "int8",
    }
}

fn values_cell(record: &FrameRecord) -> String {
    let Some(values) = &record.values else {
        return "-".to_string();
    };
    let ints = values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    match &record.units {
        Some(units) => {
            let units = units
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("{ints} [{units}]")
        }
        None => ints,
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
