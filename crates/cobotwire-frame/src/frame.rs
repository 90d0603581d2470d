use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{FOOTER, HEADER};
use crate::error::{FrameError, Result};

/// Header (2) + length byte (1).
pub const PREFIX_SIZE: usize = 3;

/// Offset of the first payload byte: header, length, command.
pub const PAYLOAD_OFFSET: usize = 4;

/// The length byte counts the command byte and the footer on top of the payload.
pub const LENGTH_OVERHEAD: usize = 2;

/// Largest payload whose length still fits the one-byte length field.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - LENGTH_OVERHEAD;

/// A raw protocol frame, exactly as read from the wire.
///
/// ```text
/// ┌───────────┬────────┬─────────┬────────────────────┬────────┐
/// │ 0xFE 0xFE │ Length │ Command │ Payload            │ Footer │
/// │           │ (1B)   │ (1B)    │ (Length - 2 bytes) │ 0xFA   │
/// └───────────┴────────┴─────────┴────────────────────┴────────┘
/// ```
///
/// The length byte counts everything after itself. The footer is reserved in
/// the length but not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Bytes,
}

impl Frame {
    /// Wrap raw bytes that start with the frame header.
    ///
    /// Returns `None` if `raw` is shorter than the prefix or does not start
    /// with `0xFE 0xFE`. The body may be shorter than declared; accessors clamp.
    pub fn parse(raw: impl Into<Bytes>) -> Option<Self> {
        let raw = raw.into();
        if raw.len() < PREFIX_SIZE || raw[0] != HEADER || raw[1] != HEADER {
            return None;
        }
        Some(Self { raw })
    }

    /// Find the first frame in an arbitrary buffer.
    ///
    /// Skips leading garbage and any header whose length byte is too small to
    /// carry a payload. The returned frame is cut to its declared length, or
    /// to the end of `data` if the buffer stops early.
    pub fn locate(data: &[u8]) -> Option<Self> {
        let idx = data.windows(PREFIX_SIZE).position(|w| {
            w[0] == HEADER && w[1] == HEADER && usize::from(w[2]) > LENGTH_OVERHEAD
        })?;
        let end = (idx + PREFIX_SIZE + usize::from(data[idx + 2])).min(data.len());
        Some(Self {
            raw: Bytes::copy_from_slice(&data[idx..end]),
        })
    }

    pub(crate) fn from_parts(raw: Bytes) -> Self {
        Self { raw }
    }

    /// All frame bytes including the header.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.raw
    }

    /// The declared length: number of bytes following the length byte.
    pub fn declared_len(&self) -> u8 {
        self.raw[2]
    }

    /// The command byte, if the frame carries one.
    pub fn command(&self) -> Option<u8> {
        self.raw.get(PREFIX_SIZE).copied()
    }

    /// Payload length implied by the length byte (may be zero).
    pub fn body_len(&self) -> usize {
        usize::from(self.declared_len()).saturating_sub(LENGTH_OVERHEAD)
    }

    /// The payload bytes, clamped to what was actually received.
    pub fn payload(&self) -> &[u8] {
        let start = PAYLOAD_OFFSET.min(self.raw.len());
        let end = (PAYLOAD_OFFSET + self.body_len()).min(self.raw.len());
        &self.raw[start..end]
    }

    /// The byte in the footer position, if present.
    pub fn footer(&self) -> Option<u8> {
        if usize::from(self.declared_len()) < LENGTH_OVERHEAD {
            return None;
        }
        self.raw.get(PAYLOAD_OFFSET + self.body_len()).copied()
    }

    /// Whether the footer position holds `0xFA`.
    pub fn has_footer(&self) -> bool {
        self.footer() == Some(FOOTER)
    }

    /// Whether every declared byte is present.
    pub fn is_complete(&self) -> bool {
        self.raw.len() >= PREFIX_SIZE + usize::from(self.declared_len())
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }
}

/// Encode a command into the wire format.
///
/// Wire format: `0xFE 0xFE <payload.len() + 2> <command> <payload> 0xFA`.
pub fn encode_command(command: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(PAYLOAD_OFFSET + payload.len() + 1);
    dst.put_slice(&[HEADER, HEADER]);
    dst.put_u8((payload.len() + LENGTH_OVERHEAD) as u8);
    dst.put_u8(command);
    dst.put_slice(payload);
    dst.put_u8(FOOTER);
    Ok(())
}
