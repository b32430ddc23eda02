//! DBC message declaration reader
//!
//! Only the `BO_ <id> <name>: <size> <transmitter>` lines of a DBC file are
//! read. Signals, attributes and everything else are ignored.

use std::borrow::Cow;

/// Longest message name kept in the table
pub(crate) const MESSAGE_NAME_MAX: usize = 63;

/// Parse a message declaration line into `(name, id)`
///
/// Returns `None` for anything that is not a well formed `BO_` line.
pub(crate) fn parse_message_line(line: &str) -> Option<(String, u32)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "BO_" {
        return None;
    }

    let id: u32 = parts.next()?.parse().ok()?;

    let raw_name = parts.next()?;
    let name = raw_name.strip_suffix(':').unwrap_or(raw_name);
    if name.is_empty() || name.len() > MESSAGE_NAME_MAX {
        log::debug!("Ignoring DBC message name {:?}", raw_name);
        return None;
    }

    Some((name.to_string(), id))
}

/// Decode one raw DBC line, falling back to Latin-1 for non UTF-8 content
pub(crate) fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        // Latin-1 maps every byte to the code point of the same value
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}
