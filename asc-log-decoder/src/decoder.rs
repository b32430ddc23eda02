//! Main converter API
//!
//! This module provides the primary interface for the library. The
//! [`Converter`] owns the message name table and turns ASC traces into
//! output records, either as an iterator or written straight to a sink.

use crate::config::ConverterConfig;
use crate::database::MessageTable;
use crate::formats::asc::{AscRecords, ConversionStats};
use crate::output::RecordSink;
use crate::types::Result;
use std::io::BufRead;
use std::path::Path;

/// The main converter struct - entry point for all conversions
#[derive(Debug, Clone, Default)]
pub struct Converter {
    /// Symbolic message names (loaded from DBC files)
    messages: MessageTable,
    config: ConverterConfig,
}

impl Converter {
    /// Create a new converter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with the given configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            messages: MessageTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Load message names from a DBC file
    ///
    /// Names from later files replace names loaded earlier.
    ///
    /// # Example
    /// ```no_run
    /// use asc_log_decoder::Converter;
    /// use std::path::Path;
    ///
    /// let mut converter = Converter::new();
    /// converter.add_dbc(Path::new("powertrain.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        self.messages.load_file(path)?;
        Ok(())
    }

    /// Load message names from DBC content held in memory or a stream
    pub fn add_dbc_reader<R: BufRead>(&mut self, reader: R) -> usize {
        self.messages.extend_from_reader(reader)
    }

    pub fn message_table(&self) -> &MessageTable {
        &self.messages
    }

    /// Iterate over the records of an ASC trace
    ///
    /// # Example
    /// ```no_run
    /// use asc_log_decoder::Converter;
    /// use std::fs::File;
    /// use std::io::BufReader;
    ///
    /// let converter = Converter::new();
    /// let trace = BufReader::new(File::open("trace.asc").unwrap());
    ///
    /// for record in converter.records(trace) {
    ///     match record {
    ///         Ok(record) => println!("{} {:?}", record.timestamp, record.frame),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn records<R: BufRead>(&self, reader: R) -> AscRecords<'_, R> {
        AscRecords::new(reader, &self.messages, self.config.clone())
    }

    /// Convert a whole trace, handing every record to `sink` as soon as it
    /// is produced
    pub fn convert<R: BufRead, S: RecordSink>(
        &self,
        reader: R,
        sink: &mut S,
    ) -> Result<ConversionStats> {
        let mut records = self.records(reader);

        for record in records.by_ref() {
            sink.write_record(&record?)?;
        }

        let stats = *records.stats();
        log::info!(
            "Converted {} frames and {} error frames from {} lines ({} skipped)",
            stats.frames,
            stats.error_frames,
            stats.lines_processed,
            stats.lines_skipped
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutputRecord, RecordFrame};
    use std::io::Cursor;

    #[test]
    fn test_converter_creation() {
        let converter = Converter::new();
        assert!(converter.message_table().is_empty());
        assert!(!converter.config().raw_timestamps);
    }

    #[test]
    fn test_add_dbc_reader() {
        let mut converter = Converter::new();
        let added = converter.add_dbc_reader(Cursor::new("BO_ 291 EngineData: 8 ECU1\n"));
        assert_eq!(added, 1);
        assert_eq!(converter.message_table().resolve("EngineData"), Some(291));
    }

    #[test]
    fn test_missing_dbc_file() {
        let mut converter = Converter::new();
        assert!(converter.add_dbc(Path::new("does/not/exist.dbc")).is_err());
    }

    #[test]
    fn test_convert_into_vec_sink() {
        let mut converter = Converter::with_config(ConverterConfig::new().with_raw_timestamps(true));
        converter.add_dbc_reader(Cursor::new("BO_ 1024 Brake: 1 ECU\n"));

        let trace = "base dec timestamps absolute\n\
            0.0001 1 1 Rx d 0\n\
            0.0002 1 Brake Rx d 1 3\n\
            0.0003 1 ErrorFrame\n";

        let mut sink: Vec<OutputRecord> = Vec::new();
        let stats = converter.convert(Cursor::new(trace), &mut sink).unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.error_frames, 1);
        assert_eq!(sink.len(), 2);
        match &sink[0].frame {
            RecordFrame::Data(frame) => assert_eq!(frame.id.value, 1024),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_convert_reports_fatal_header() {
        let converter = Converter::new();
        let mut sink: Vec<OutputRecord> = Vec::new();
        let result = converter.convert(Cursor::new("base hex timestamps sometimes\n"), &mut sink);
        assert!(result.is_err());
        assert!(sink.is_empty());
    }
}
