//! CAN data frame lines
//!
//! ```text
//! 0.002367 1  390x  Rx   d 8 17 00 14 00 C0 00 08 00
//! <time>  <ch> <id> <dir> <r|d> <len> <bytes...>
//! ```
//!
//! The identifier is either numeric (with an `x` suffix for extended ids) or
//! a message name from the DBC.

use super::header::NumericBase;
use super::{parse_line_timestamp, LineParser, ParsedLine};
use crate::database::MessageTable;
use crate::types::{CanFrame, CanId, RecordFrame, TimeSpec, CAN_EFF_MASK, CAN_MAX_DLEN};

/// Frame fields exactly as read from a data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub id_token: String,
    pub is_remote: bool,
    pub length: u8,
    pub bytes: Vec<u8>,
}

/// Reads data frame lines of a calibrated trace
pub struct FrameLineParser<'a> {
    base: NumericBase,
    messages: &'a MessageTable,
}

impl<'a> FrameLineParser<'a> {
    pub fn new(base: NumericBase, messages: &'a MessageTable) -> Self {
        Self { base, messages }
    }

    /// Split a data line into timestamp, channel and raw frame
    ///
    /// The line only matches when the number of data bytes that follow the
    /// length field equals the length.
    pub fn parse_raw(&self, line: &str) -> Option<(TimeSpec, i32, RawFrame)> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            return None;
        }

        let timestamp = parse_line_timestamp(parts[0])?;
        let interface: i32 = parts[1].parse().ok()?;
        let id_token = parts[2];
        // parts[3] is the direction (Rx/Tx)
        let flag = parts[4].chars().next()?;
        let length: i32 = parts[5].parse().ok()?;

        let radix = self.base.radix();
        let bytes: Vec<u8> = parts[6..]
            .iter()
            .take(CAN_MAX_DLEN)
            .map_while(|token| parse_byte(token, radix))
            .collect();

        if usize::try_from(length).ok()? != bytes.len() {
            return None;
        }

        Some((
            timestamp,
            interface,
            RawFrame {
                id_token: id_token.to_string(),
                is_remote: flag == 'r',
                length: (length as u8) & 0x0F,
                bytes,
            },
        ))
    }

    /// Resolve an identifier token: message name first, then numeric
    pub fn resolve_id(&self, id_token: &str) -> CanId {
        if let Some(id) = self.messages.resolve(id_token) {
            return CanId::from_database(id);
        }

        let radix = self.base.radix();
        match id_token.strip_suffix('x') {
            Some(digits) => CanId::extended(parse_radix_prefix(digits, radix)),
            None => CanId::standard(parse_radix_prefix(id_token, radix) & CAN_EFF_MASK),
        }
    }
}

impl LineParser for FrameLineParser<'_> {
    fn try_parse(&self, line: &str) -> Option<ParsedLine> {
        let (timestamp, interface, raw) = self.parse_raw(line)?;

        let mut id = self.resolve_id(&raw.id_token);
        id.is_remote = raw.is_remote;

        let mut data = [0u8; CAN_MAX_DLEN];
        data[..raw.bytes.len()].copy_from_slice(&raw.bytes);

        Some(ParsedLine {
            timestamp,
            interface,
            frame: RecordFrame::Data(CanFrame {
                id,
                dlc: raw.length,
                data,
            }),
        })
    }
}

/// One data byte in the trace radix, masked to 8 bits
fn parse_byte(token: &str, radix: u32) -> Option<u8> {
    u32::from_str_radix(token, radix)
        .ok()
        .map(|value| (value & 0xFF) as u8)
}

/// Value of the leading digits of `token`, zero when there are none.
/// Hex tokens may carry a `0x` prefix.
fn parse_radix_prefix(token: &str, radix: u32) -> u32 {
    let digits = if radix == 16 {
        token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token)
    } else {
        token
    };

    digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0u32, |acc, digit| acc.saturating_mul(radix).saturating_add(digit))
}
