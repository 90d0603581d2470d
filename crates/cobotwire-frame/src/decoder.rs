//! Command-aware payload decoding.
//!
//! The wire format carries no type tag. How a payload is read depends on its
//! length and, for a few commands, on which command it answers. Both are
//! captured by [`rule_for`]: special cases are looked up first, then the
//! length defaults apply.

use tracing::{debug, trace};

use crate::codec::{decode_int16, decode_int8};
use crate::command::Command;
use crate::frame::Frame;

/// Returned by [`unwrap_single`] when there is no value.
pub const NO_VALUE: i32 = -1;

/// How to interpret a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Every 2-byte chunk is a big-endian int16.
    Int16List,
    /// The first two bytes are one big-endian int16.
    Int16,
    /// The byte at this offset is one int8.
    Int8At(usize),
}

/// A decoded response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// Joint angles, coordinates or encoder sets.
    Int16List(Vec<i16>),
    Int16(i16),
    Int8(i8),
}

impl DecodedValue {
    /// The first value, widened.
    pub fn first(&self) -> Option<i32> {
        match self {
            DecodedValue::Int16List(values) => values.first().copied().map(i32::from),
            DecodedValue::Int16(v) => Some(i32::from(*v)),
            DecodedValue::Int8(v) => Some(i32::from(*v)),
        }
    }

    /// All values, widened.
    pub fn to_vec(&self) -> Vec<i32> {
        match self {
            DecodedValue::Int16List(values) => values.iter().copied().map(i32::from).collect(),
            DecodedValue::Int16(v) => vec![i32::from(*v)],
            DecodedValue::Int8(v) => vec![i32::from(*v)],
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            DecodedValue::Int16List(values) => values.len(),
            DecodedValue::Int16(_) | DecodedValue::Int8(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct SpecialCase {
    command: Command,
    body_len: usize,
    rule: DecodeRule,
}

/// Payloads whose meaning depends on the command.
const SPECIAL_CASES: &[SpecialCase] = &[
    // First byte is reserved; the flag is in the second.
    SpecialCase {
        command: Command::IsServoEnable,
        body_len: 2,
        rule: DecodeRule::Int8At(1),
    },
];

/// Select the rule for a payload of `body_len` bytes answering `command`.
pub fn rule_for(command: u8, body_len: usize) -> DecodeRule {
    if let Some(case) = SPECIAL_CASES
        .iter()
        .find(|case| case.command.code() == command && case.body_len == body_len)
    {
        return case.rule;
    }
    match body_len {
        12 | 8 => DecodeRule::Int16List,
        2 => DecodeRule::Int16,
        _ => DecodeRule::Int8At(0),
    }
}

/// Apply `rule` to a payload. Payloads too short for the rule yield `None`.
pub fn apply_rule(rule: DecodeRule, body: &[u8]) -> Option<DecodedValue> {
    match rule {
        DecodeRule::Int16List => Some(DecodedValue::Int16List(
            body.chunks_exact(2)
                .filter_map(|pair| decode_int16(pair).ok())
                .collect(),
        )),
        DecodeRule::Int16 => decode_int16(body.get(..2)?).ok().map(DecodedValue::Int16),
        DecodeRule::Int8At(offset) => decode_int8(body.get(offset..offset + 1)?)
            .ok()
            .map(DecodedValue::Int8),
    }
}

/// Decode a frame received in answer to `expected`.
///
/// Returns `None` when the frame answers a different command or carries no
/// payload. Neither is an error: the caller reads again.
pub fn decode(frame: &Frame, expected: impl Into<u8>) -> Option<DecodedValue> {
    let expected = expected.into();
    let command = frame.command()?;
    if command != expected {
        debug!(
            expected = format_args!("0x{expected:02X}"),
            received = format_args!("0x{command:02X}"),
            "response for a different command"
        );
        return None;
    }

    let body_len = frame.body_len();
    if body_len == 0 {
        trace!(declared = frame.declared_len(), "frame carries no payload");
        return None;
    }
    if !frame.has_footer() {
        trace!(footer = ?frame.footer(), "frame footer absent or unexpected");
    }

    apply_rule(rule_for(command, body_len), frame.payload())
}

/// Locate the first frame in `data` and decode it.
pub fn decode_bytes(data: &[u8], expected: impl Into<u8>) -> Option<DecodedValue> {
    let frame = Frame::locate(data)?;
    decode(&frame, expected)
}

/// The first decoded value, or [`NO_VALUE`] if there is none.
pub fn unwrap_single(value: Option<&DecodedValue>) -> i32 {
    value.and_then(DecodedValue::first).unwrap_or(NO_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bytes: &[u8]) -> Frame {
        Frame::parse(bytes.to_vec()).unwrap()
    }

    #[test]
    fn angles_decode_to_six_int16() {
        let f = frame(&[
            0xFE, 0xFE, 0x0E, 0x20, // header, len 14, GET_ANGLES
            0x00, 0x64, 0xFF, 0x9C, 0x23, 0x28, 0xDC, 0xD8, 0x00, 0x00, 0x7F, 0xFF, //
            0xFA,
        ]);
        assert_eq!(
            decode(&f, Command::GetAngles),
            Some(DecodedValue::Int16List(vec![100, -100, 9000, -9000, 0, 32767]))
        );
    }

    #[test]
    fn encoders_decode_to_four_int16() {
        let f = frame(&[
            0xFE, 0xFE, 0x0A, 0x3D, 0x08, 0x00, 0x07, 0xFF, 0x00, 0x01, 0x80, 0x00, 0xFA,
        ]);
        assert_eq!(
            decode(&f, Command::GetEncoders),
            Some(DecodedValue::Int16List(vec![2048, 2047, 1, -32768]))
        );
    }

    #[test]
    fn command_mismatch_is_empty() {
        let f = frame(&[0xFE, 0xFE, 0x04, 0x21, 0x00, 0x01, 0xFA]);
        assert_eq!(decode(&f, 0x20u8), None);
    }

    #[test]
    fn servo_enable_reads_second_byte_only() {
        let f = frame(&[0xFE, 0xFE, 0x04, 0x50, 0x7F, 0x01, 0xFA]);
        assert_eq!(decode(&f, Command::IsServoEnable), Some(DecodedValue::Int8(1)));

        let f = frame(&[0xFE, 0xFE, 0x04, 0x50, 0x00, 0xFF, 0xFA]);
        assert_eq!(decode(&f, Command::IsServoEnable), Some(DecodedValue::Int8(-1)));
    }

    #[test]
    fn two_byte_body_is_int16_otherwise() {
        let f = frame(&[0xFE, 0xFE, 0x04, 0x40, 0xFF, 0xFE, 0xFA]);
        assert_eq!(decode(&f, Command::GetSpeed), Some(DecodedValue::Int16(-2)));
    }

    #[test]
    fn single_byte_body_is_int8() {
        let f = frame(&[0xFE, 0xFE, 0x03, 0x12, 0x01, 0xFA]);
        assert_eq!(decode(&f, Command::IsPowerOn), Some(DecodedValue::Int8(1)));

        let f = frame(&[0xFE, 0xFE, 0x03, 0x2B, 0x80, 0xFA]);
        assert_eq!(decode(&f, Command::IsMoving), Some(DecodedValue::Int8(-128)));
    }

    #[test]
    fn odd_lengths_use_first_byte() {
        let f = frame(&[0xFE, 0xFE, 0x05, 0x00, 0x0A, 0x0B, 0x0C, 0xFA]);
        assert_eq!(decode(&f, Command::Version), Some(DecodedValue::Int8(10)));
    }

    #[test]
    fn empty_body_is_empty() {
        let f = frame(&[0xFE, 0xFE, 0x02, 0x20, 0xFA]);
        assert_eq!(decode(&f, Command::GetAngles), None);

        let f = frame(&[0xFE, 0xFE, 0x01, 0x20]);
        assert_eq!(decode(&f, Command::GetAngles), None);

        let f = frame(&[0xFE, 0xFE, 0x00]);
        assert_eq!(decode(&f, Command::Version), None);
    }

    #[test]
    fn missing_footer_is_tolerated() {
        let f = frame(&[0xFE, 0xFE, 0x03, 0x12, 0x01, 0x00]);
        assert_eq!(decode(&f, Command::IsPowerOn), Some(DecodedValue::Int8(1)));
    }

    #[test]
    fn truncated_body_degrades() {
        let f = frame(&[0xFE, 0xFE, 0x0E, 0x20, 0x00, 0x01, 0x00]);
        assert_eq!(
            decode(&f, Command::GetAngles),
            Some(DecodedValue::Int16List(vec![1]))
        );

        let f = frame(&[0xFE, 0xFE, 0x04, 0x40, 0x01]);
        assert_eq!(decode(&f, Command::GetSpeed), None);
    }

    #[test]
    fn rule_table() {
        assert_eq!(rule_for(0x20, 12), DecodeRule::Int16List);
        assert_eq!(rule_for(0x3D, 8), DecodeRule::Int16List);
        assert_eq!(rule_for(0x40, 2), DecodeRule::Int16);
        assert_eq!(rule_for(0x50, 2), DecodeRule::Int8At(1));
        assert_eq!(rule_for(0x50, 1), DecodeRule::Int8At(0));
        assert_eq!(rule_for(0x12, 1), DecodeRule::Int8At(0));
        assert_eq!(rule_for(0x00, 3), DecodeRule::Int8At(0));
    }

    #[test]
    fn decode_bytes_scans_buffer() {
        let data = [0x00, 0x01, 0xFE, 0xFE, 0x04, 0x40, 0x00, 0x64, 0xFA];
        assert_eq!(
            decode_bytes(&data, Command::GetSpeed),
            Some(DecodedValue::Int16(100))
        );
        assert_eq!(decode_bytes(&[], Command::GetSpeed), None);
    }

    #[test]
    fn unwrap_single_values() {
        assert_eq!(unwrap_single(Some(&DecodedValue::Int8(1))), 1);
        assert_eq!(unwrap_single(Some(&DecodedValue::Int16(-300))), -300);
        assert_eq!(
            unwrap_single(Some(&DecodedValue::Int16List(vec![5, 6]))),
            5
        );
        assert_eq!(unwrap_single(Some(&DecodedValue::Int16List(vec![]))), NO_VALUE);
        assert_eq!(unwrap_single(None), -1);
    }

    #[test]
    fn value_accessors() {
        let v = DecodedValue::Int16List(vec![1, -2, 3]);
        assert_eq!(v.to_vec(), vec![1, -2, 3]);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(DecodedValue::Int8(-5).to_vec(), vec![-5]);
        assert!(DecodedValue::Int16List(vec![]).is_empty());
    }
}
