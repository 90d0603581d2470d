use std::time::Duration;

use cobotwire_frame::CommandArg;

use crate::exit::{CliError, CliResult, USAGE};

/// Parse hex bytes. Tokens may be separated by whitespace or commas, carry a
/// `0x` prefix, or run together as digit pairs (`FEFE0220FA`).
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let mut out = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || digits.len() % 2 != 0 || !digits.is_ascii() {
            return Err(CliError::new(USAGE, format!("invalid hex byte: {token}")));
        }
        for pair in digits.as_bytes().chunks(2) {
            // ASCII checked above.
            let pair = std::str::from_utf8(pair).unwrap_or_default();
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {token}")))?;
            out.push(byte);
        }
    }
    Ok(out)
}

/// Parse a payload list such as `1,[100,-200],50`.
///
/// Bare items are bytes (0..=255); bracketed groups are int16 blocks.
pub fn parse_arg_list(input: &str) -> CliResult<Vec<CommandArg>> {
    let mut out = Vec::new();
    let mut rest = input.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let end = after
                .find(']')
                .ok_or_else(|| CliError::new(USAGE, format!("unclosed '[' in: {input}")))?;
            let block = after[..end]
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| {
                    t.parse::<i32>()
                        .map_err(|_| CliError::new(USAGE, format!("invalid block value: {t}")))
                })
                .collect::<CliResult<Vec<i32>>>()?;
            out.push(CommandArg::Block(block));
            rest = after[end + 1..].trim_start();
            if !rest.is_empty() && !rest.starts_with(',') {
                return Err(CliError::new(USAGE, format!("expected ',' after ']' in: {input}")));
            }
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            let token = rest[..end].trim();
            if !token.is_empty() {
                let byte = token.parse::<u8>().map_err(|_| {
                    CliError::new(USAGE, format!("invalid byte value (0..=255): {token}"))
                })?;
                out.push(CommandArg::Byte(byte));
            }
            rest = &rest[end..];
        }
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Ok(out)
}

/// Parse comma separated decimal numbers, e.g. `0,90.5,-90`.
pub fn parse_float_list(input: &str) -> CliResult<Vec<f64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid number: {t}")))
        })
        .collect()
}

#[cfg_attr(not(feature = "serial"), allow(dead_code))]
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "s" => Ok(Duration::from_secs(value)),
        _ => Ok(Duration::from_millis(value)),
    }
}
