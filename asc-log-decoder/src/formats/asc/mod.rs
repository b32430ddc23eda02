//! Vector ASC trace reader
//!
//! ASC is a line oriented text format. The header describes how to read the
//! data lines that follow:
//!
//! ```text
//! date Wed Jun 12 02:06:08 pm 2019
//! base hex  timestamps absolute
//! internal events logged
//! Begin Triggerblock Wed Jun 12 02:06:08 pm 2019
//!    0.000000 Start of measurement
//!    0.002367 1  390x  Rx   d 8 17 00 14 00 C0 00 08 00
//!    0.003112 1  ErrorFrame
//! End TriggerBlock
//! ```
//!
//! [`AscRecords`] drives the header detection, the line parsers and the
//! timestamp calculation and yields one [`OutputRecord`] per frame line.

pub mod date;
pub mod error_frame;
pub mod frame;
pub mod header;
pub mod timestamp;

pub use error_frame::ErrorLineParser;
pub use frame::{FrameLineParser, RawFrame};
pub use header::{
    Calibration, DecimalPlaces, HeaderDetector, HeaderState, NumericBase, ParserCalibration,
    TimestampMode,
};

use crate::config::ConverterConfig;
use crate::database::MessageTable;
use crate::types::{OutputRecord, RecordFrame, Result, TimeSpec};
use std::io::BufRead;

/// A trace line that matched one of the line grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Timestamp as written on the line (fractional part not yet scaled)
    pub timestamp: TimeSpec,
    pub interface: i32,
    pub frame: RecordFrame,
}

/// One line grammar. Parsers have no side effects; `None` means the line
/// belongs to some other grammar.
pub trait LineParser {
    fn try_parse(&self, line: &str) -> Option<ParsedLine>;
}

/// `<seconds>.<fraction>` with the fraction read as a plain integer
pub(crate) fn parse_line_timestamp(token: &str) -> Option<TimeSpec> {
    let (seconds, fraction) = token.split_once('.')?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(TimeSpec::new(seconds.parse().ok()?, fraction.parse().ok()?))
}

/// Counters for one conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Lines read from the trace
    pub lines_processed: usize,
    /// Lines consumed while learning the trace format
    pub header_lines: usize,
    /// Lines after the header that matched no grammar
    pub lines_skipped: usize,
    pub frames: usize,
    pub error_frames: usize,
}

enum Stage {
    Calibrating(HeaderDetector),
    Ready(Calibration),
}

/// Iterator converting ASC trace lines into output records
///
/// A fatal header error is yielded once and ends the iteration.
pub struct AscRecords<'a, R> {
    reader: R,
    messages: &'a MessageTable,
    config: ConverterConfig,
    stage: Stage,
    /// Running total for relative timestamps
    accumulator: TimeSpec,
    line_buf: Vec<u8>,
    stats: ConversionStats,
    finished: bool,
}

impl<'a, R: BufRead> AscRecords<'a, R> {
    pub fn new(reader: R, messages: &'a MessageTable, config: ConverterConfig) -> Self {
        Self {
            reader,
            messages,
            config,
            stage: Stage::Calibrating(HeaderDetector::new()),
            accumulator: TimeSpec::ZERO,
            line_buf: Vec::new(),
            stats: ConversionStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    /// Trace format, once the header has been read
    pub fn calibration(&self) -> Option<&Calibration> {
        match &self.stage {
            Stage::Ready(calibration) => Some(calibration),
            Stage::Calibrating(_) => None,
        }
    }

    /// Process one trace line
    ///
    /// Header lines and lines matching no grammar produce `Ok(None)`.
    pub fn process_line(&mut self, line: &str) -> Result<Option<OutputRecord>> {
        self.stats.lines_processed += 1;

        if let Stage::Calibrating(detector) = &mut self.stage {
            self.stats.header_lines += 1;
            if detector.feed(line)? == HeaderState::Ready {
                if let Some(calibration) = detector.calibration().complete() {
                    self.stage = Stage::Ready(calibration);
                }
            }
            return Ok(None);
        }

        let Stage::Ready(calibration) = &mut self.stage else {
            return Ok(None);
        };

        let parsed = FrameLineParser::new(calibration.base, self.messages)
            .try_parse(line)
            .or_else(|| ErrorLineParser.try_parse(line));

        let Some(parsed) = parsed else {
            log::trace!("Skipping line: {}", line.trim_end());
            self.stats.lines_skipped += 1;
            return Ok(None);
        };

        let timestamp = if self.config.raw_timestamps {
            parsed.timestamp
        } else {
            let session_date = calibration.session_date();
            timestamp::compute(
                &mut self.accumulator,
                parsed.timestamp,
                session_date,
                calibration.timestamp_mode,
                calibration.decimal_places,
            )
        };

        match parsed.frame {
            RecordFrame::Data(_) => self.stats.frames += 1,
            RecordFrame::Error(_) => self.stats.error_frames += 1,
        }

        Ok(Some(OutputRecord {
            timestamp,
            interface: parsed.interface,
            frame: parsed.frame,
        }))
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.line_buf.clear();
        let bytes_read = self.reader.read_until(b'\n', &mut self.line_buf)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.line_buf).into_owned()))
    }
}

impl<'a, R: BufRead> Iterator for AscRecords<'a, R> {
    type Item = Result<OutputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.finished = true;
                    if self.calibration().is_none() {
                        log::warn!("Trace ended before the header was complete");
                    }
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            match self.process_line(&line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanId, ErrorFrame};
    use std::io::Cursor;

    const HEADER: &str = "date Wed Jun 12 02:06:08 pm 2019\n\
        base hex  timestamps absolute\n\
        internal events logged\n\
        Begin Triggerblock Wed Jun 12 02:06:08 pm 2019\n\
        \x20  0.000000 Start of measurement\n\
        \x20  0.001000 1  100  Rx   d 1 01\n";

    fn collect(input: &str, config: ConverterConfig) -> Vec<OutputRecord> {
        let table = MessageTable::new();
        AscRecords::new(Cursor::new(input), &table, config)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_parse_line_timestamp() {
        assert_eq!(parse_line_timestamp("0.002367"), Some(TimeSpec::new(0, 2367)));
        assert_eq!(parse_line_timestamp("12.5000"), Some(TimeSpec::new(12, 5000)));
        assert_eq!(parse_line_timestamp("12"), None);
        assert_eq!(parse_line_timestamp("12."), None);
        assert_eq!(parse_line_timestamp("a.5000"), None);
        assert_eq!(parse_line_timestamp("1.-5"), None);
    }

    #[test]
    fn test_calibrating_line_is_consumed() {
        let records = collect(HEADER, ConverterConfig::new());
        assert!(records.is_empty());
    }

    #[test]
    fn test_frames_after_header() {
        let input = format!(
            "{}   0.002367 1  390x  Rx   d 8 17 00 14 00 C0 00 08 00\n\
             \x20  0.003000 2  ErrorFrame\n\
             End TriggerBlock\n",
            HEADER
        );
        let records = collect(&input, ConverterConfig::new());
        assert_eq!(records.len(), 2);

        let session = records[0].timestamp.seconds;
        assert_eq!(records[0].timestamp.microseconds, 2367);
        assert_eq!(records[0].interface, 1);
        match &records[0].frame {
            RecordFrame::Data(frame) => assert_eq!(frame.id, CanId::extended(0x390)),
            other => panic!("unexpected frame {:?}", other),
        }

        assert_eq!(records[1].timestamp, TimeSpec::new(session, 3000));
        assert_eq!(records[1].interface, 2);
        assert_eq!(records[1].frame, RecordFrame::Error(ErrorFrame::bus_error()));
    }

    #[test]
    fn test_rejected_frame_line_falls_back_to_error_grammar() {
        let input = "base hex timestamps absolute\n\
            0.0000 1 Statistic:\n\
            0.0010 1 ErrorFrame Rx d 8 00\n\
            0.0020 2 ErrorFrame ECC: 10100010\n";
        let records = collect(input, ConverterConfig::new().with_raw_timestamps(true));

        assert_eq!(records.len(), 2);
        for (record, interface) in records.iter().zip([1, 2]) {
            assert_eq!(record.interface, interface);
            assert_eq!(record.frame, RecordFrame::Error(ErrorFrame::bus_error()));
        }
    }

    #[test]
    fn test_raw_timestamps_pass_through() {
        let input = "base dec timestamps relative\n\
            0.1000 1 100 Rx d 0\n\
            0.2500 1 100 Rx d 0\n\
            0.2500 1 100 Rx d 0\n";
        let records = collect(input, ConverterConfig::new().with_raw_timestamps(true));
        let stamps: Vec<TimeSpec> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![TimeSpec::new(0, 2500), TimeSpec::new(0, 2500)]);
    }

    #[test]
    fn test_fatal_header_error_ends_iteration() {
        let input = "base foo timestamps bar\n\
            base hex timestamps absolute\n\
            0.002367 1 390x Rx d 0\n\
            0.002367 1 390x Rx d 0\n";
        let table = MessageTable::new();
        let mut records = AscRecords::new(Cursor::new(input), &table, ConverterConfig::new());

        assert!(matches!(
            records.next(),
            Some(Err(crate::types::DecoderError::InvalidBase(_)))
        ));
        assert!(records.next().is_none());
        assert_eq!(records.stats().lines_processed, 1);
    }

    #[test]
    fn test_stats() {
        let input = format!(
            "{}   0.002367 1  390x  Rx   d 8 17 00 14 00 C0 00 08 00\n\
             \x20  0.003000 2  ErrorFrame\n\
             \n\
             End TriggerBlock\n",
            HEADER
        );
        let table = MessageTable::new();
        let mut records = AscRecords::new(Cursor::new(input), &table, ConverterConfig::new());
        assert_eq!(records.by_ref().count(), 2);

        let stats = records.stats();
        assert_eq!(stats.lines_processed, 10);
        assert_eq!(stats.header_lines, 6);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.error_frames, 1);
        assert_eq!(stats.lines_skipped, 2);
        assert!(records.calibration().is_some());
    }

    #[test]
    fn test_invalid_utf8_is_not_fatal() {
        let mut input = b"base hex timestamps absolute\n0.0010 1 1 Rx d 0\n".to_vec();
        input.extend_from_slice(b"// comment \xFF\xFE\n0.0020 1 2 Rx d 0\n");

        let table = MessageTable::new();
        let records: Vec<_> = AscRecords::new(Cursor::new(input), &table, ConverterConfig::new())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }
}
