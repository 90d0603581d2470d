//! Stateless value codec: fixed-width integers, unit scaling and argument
//! flattening.
//!
//! The controller speaks signed big-endian integers only. Angles travel in
//! hundredths of a degree and coordinates in tenths of a millimetre.

use crate::error::{FrameError, Result};

/// Protocol scale for angles: 1 unit = 0.01°.
pub const ANGLE_SCALE: f64 = 100.0;

/// Protocol scale for coordinates: 1 unit = 0.1 mm.
pub const COORD_SCALE: f64 = 10.0;

/// Encode a signed 8-bit integer.
pub fn encode_int8(value: i32) -> Result<[u8; 1]> {
    let v = i8::try_from(value).map_err(|_| out_of_range(value, "int8", i8::MIN, i8::MAX))?;
    Ok(v.to_be_bytes())
}

/// Encode a signed 16-bit integer, big-endian.
pub fn encode_int16(value: i32) -> Result<[u8; 2]> {
    let v = i16::try_from(value).map_err(|_| out_of_range(value, "int16", i16::MIN, i16::MAX))?;
    Ok(v.to_be_bytes())
}

/// Decode exactly one byte as a signed 8-bit integer.
pub fn decode_int8(bytes: &[u8]) -> Result<i8> {
    let arr: [u8; 1] = bytes.try_into().map_err(|_| FrameError::InvalidLength {
        expected: 1,
        actual: bytes.len(),
    })?;
    Ok(i8::from_be_bytes(arr))
}

/// Decode exactly two bytes as a big-endian signed 16-bit integer.
pub fn decode_int16(bytes: &[u8]) -> Result<i16> {
    let arr: [u8; 2] = bytes.try_into().map_err(|_| FrameError::InvalidLength {
        expected: 2,
        actual: bytes.len(),
    })?;
    Ok(i16::from_be_bytes(arr))
}

fn out_of_range(
    value: i32,
    width: &'static str,
    min: impl Into<i64>,
    max: impl Into<i64>,
) -> FrameError {
    FrameError::OutOfRange {
        value: i64::from(value),
        width,
        min: min.into(),
        max: max.into(),
    }
}

/// Degrees to protocol units, rounded to the nearest 0.01°.
///
/// Values beyond `i32` saturate; range checking happens when the result is
/// encoded.
pub fn angle_to_int(degrees: f64) -> i32 {
    (degrees * ANGLE_SCALE).round() as i32
}

/// Millimetres to protocol units, rounded to the nearest 0.1 mm.
pub fn coord_to_int(mm: f64) -> i32 {
    (mm * COORD_SCALE).round() as i32
}

/// Protocol units to degrees, rounded to 3 decimal places.
pub fn int_to_angle(raw: i32) -> f64 {
    round_to(f64::from(raw) / ANGLE_SCALE, 3)
}

/// Protocol units to millimetres, rounded to 2 decimal places.
pub fn int_to_coord(raw: i32) -> f64 {
    round_to(f64::from(raw) / COORD_SCALE, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// An arbitrarily nested sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    Item(T),
    Seq(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    /// A sequence of plain items.
    pub fn seq(items: impl IntoIterator<Item = T>) -> Self {
        Nested::Seq(items.into_iter().map(Nested::Item).collect())
    }
}

/// Flatten nested sequences depth-first, preserving order.
///
/// Uses an explicit stack, so nesting depth is bounded only by memory.
pub fn flatten<T: Clone>(items: &[Nested<T>]) -> Vec<T> {
    let mut out = Vec::new();
    let mut stack = vec![items.iter()];
    while let Some(top) = stack.last_mut() {
        match top.next() {
            Some(Nested::Item(value)) => out.push(value.clone()),
            Some(Nested::Seq(inner)) => stack.push(inner.iter()),
            None => {
                stack.pop();
            }
        }
    }
    out
}

/// One argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArg {
    /// A raw byte (joint id, speed, flag) sent as-is.
    Byte(u8),
    /// A block of values, each sent as a big-endian int16.
    Block(Vec<i32>),
}

/// Build the command payload from scalar bytes and int16 blocks.
///
/// Blocks are expanded in place, so one command can mix flags with
/// multi-value data, e.g. six angles followed by a speed byte.
pub fn build_command_payload(args: &[CommandArg]) -> Result<Vec<u8>> {
    if args.is_empty() {
        return Ok(Vec::new());
    }

    let mut nested = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            CommandArg::Byte(b) => nested.push(Nested::Item(*b)),
            CommandArg::Block(values) => {
                let encoded = values
                    .iter()
                    .map(|&v| encode_int16(v).map(Nested::seq))
                    .collect::<Result<Vec<_>>>()?;
                nested.push(Nested::Seq(encoded));
            }
        }
    }
    Ok(flatten(&nested))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn int8_round_trip_full_range() {
        for v in i32::from(i8::MIN)..=i32::from(i8::MAX) {
            let bytes = encode_int8(v).unwrap();
            assert_eq!(i32::from(decode_int8(&bytes).unwrap()), v);
        }
    }

    #[test]
    fn int16_round_trip_full_range() {
        for v in i32::from(i16::MIN)..=i32::from(i16::MAX) {
            let bytes = encode_int16(v).unwrap();
            assert_eq!(i32::from(decode_int16(&bytes).unwrap()), v);
        }
    }

    #[test]
    fn int16_is_big_endian_twos_complement() {
        assert_eq!(encode_int16(0x1234).unwrap(), [0x12, 0x34]);
        assert_eq!(encode_int16(-1).unwrap(), [0xFF, 0xFF]);
        assert_eq!(encode_int16(-32768).unwrap(), [0x80, 0x00]);
        assert_eq!(encode_int8(-2).unwrap(), [0xFE]);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(matches!(
            encode_int8(128),
            Err(FrameError::OutOfRange { value: 128, .. })
        ));
        assert!(matches!(encode_int8(-129), Err(FrameError::OutOfRange { .. })));
        assert!(matches!(
            encode_int16(32768),
            Err(FrameError::OutOfRange { value: 32768, min: -32768, max: 32767, .. })
        ));
        assert!(matches!(encode_int16(-32769), Err(FrameError::OutOfRange { .. })));
    }

    #[test]
    fn wrong_length_decode_fails() {
        assert!(matches!(
            decode_int8(&[]),
            Err(FrameError::InvalidLength { expected: 1, actual: 0 })
        ));
        assert!(matches!(
            decode_int16(&[1, 2, 3]),
            Err(FrameError::InvalidLength { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(angle_to_int(12.34), 1234);
        assert_eq!(angle_to_int(-90.0), -9000);
        assert_eq!(angle_to_int(0.29), 29);
        assert_eq!(coord_to_int(150.5), 1505);
        assert_eq!(coord_to_int(-0.04), 0);
        assert_eq!(int_to_angle(1234), 12.34);
        assert_eq!(int_to_angle(-1), -0.01);
        assert_eq!(int_to_coord(1505), 150.5);
        assert_eq!(int_to_coord(-3), -0.3);
    }

    #[test]
    fn flatten_empty() {
        assert!(flatten::<u8>(&[]).is_empty());
        let hollow = [Nested::Seq(vec![]), Nested::Seq(vec![Nested::Seq(vec![])])];
        assert!(flatten::<u8>(&hollow).is_empty());
    }

    #[test]
    fn flatten_preserves_order() {
        let input = vec![
            Nested::Item(1),
            Nested::Seq(vec![Nested::Item(2), Nested::Seq(vec![Nested::Item(3)])]),
            Nested::Item(4),
        ];
        assert_eq!(flatten(&input), vec![1, 2, 3, 4]);
    }

    #[test]
    fn flatten_deep_nesting() {
        let mut value = Nested::Item(7u8);
        for _ in 0..1_000 {
            value = Nested::Seq(vec![value]);
        }
        assert_eq!(flatten(&[value]), vec![7]);
    }

    #[test]
    fn payload_empty_args() {
        assert!(build_command_payload(&[]).unwrap().is_empty());
    }

    #[test]
    fn payload_mixes_blocks_and_bytes() {
        let args = [
            CommandArg::Byte(1),
            CommandArg::Block(vec![1000, -1]),
            CommandArg::Byte(50),
        ];
        assert_eq!(
            build_command_payload(&args).unwrap(),
            vec![1, 0x03, 0xE8, 0xFF, 0xFF, 50]
        );
    }

    #[test]
    fn payload_block_out_of_range() {
        let args = [CommandArg::Block(vec![0, 40_000])];
        assert!(matches!(
            build_command_payload(&args),
            Err(FrameError::OutOfRange { value: 40_000, .. })
        ));
    }

    fn nested_strategy() -> impl Strategy<Value = Nested<u8>> {
        any::<u8>().prop_map(Nested::Item).prop_recursive(4, 64, 6, |inner| {
            prop::collection::vec(inner, 0..6).prop_map(Nested::Seq)
        })
    }

    proptest! {
        #[test]
        fn flatten_is_idempotent(input in prop::collection::vec(nested_strategy(), 0..8)) {
            let once = flatten(&input);
            let rewrapped: Vec<Nested<u8>> = once.iter().copied().map(Nested::Item).collect();
            prop_assert_eq!(flatten(&rewrapped), once);
        }

        #[test]
        fn angle_round_trip_is_bounded(angle in -180.0f64..180.0) {
            let back = int_to_angle(angle_to_int(angle));
            prop_assert!((back - angle).abs() <= 0.005 + 1e-9);
        }

        #[test]
        fn coord_round_trip_is_bounded(mm in -3000.0f64..3000.0) {
            let back = int_to_coord(coord_to_int(mm));
            prop_assert!((back - mm).abs() <= 0.05 + 1e-9);
        }
    }
}
