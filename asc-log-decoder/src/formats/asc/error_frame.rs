//! Error frame lines (`0.002367 1 ErrorFrame ...`)

use super::{parse_line_timestamp, LineParser, ParsedLine};
use crate::types::{ErrorFrame, RecordFrame};

const ERROR_FRAME_MARKER: &str = "ErrorFrame";

/// Turns `ErrorFrame` lines into generic bus error frames
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLineParser;

impl LineParser for ErrorLineParser {
    fn try_parse(&self, line: &str) -> Option<ParsedLine> {
        let mut parts = line.split_whitespace();
        let timestamp = parse_line_timestamp(parts.next()?)?;
        let interface: i32 = parts.next()?.parse().ok()?;

        if !parts.next()?.starts_with(ERROR_FRAME_MARKER) {
            return None;
        }

        Some(ParsedLine {
            timestamp,
            interface,
            frame: RecordFrame::Error(ErrorFrame::bus_error()),
        })
    }
}
