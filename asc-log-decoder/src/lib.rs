//! ASC Log Decoder Library
//!
//! Converts Vector ASC CAN traces into the compact candump log format used by
//! the Linux can-utils.
//!
//! # Architecture
//!
//! The converter reads a trace line by line:
//! - Header lines teach it the numeric base, the timestamp mode, the
//!   measurement start date and the timestamp precision
//! - Data lines become CAN frames, `ErrorFrame` lines become bus error frames
//! - Timestamps are scaled to microseconds and made absolute
//! - Message names from a DBC file can stand in for numeric identifiers
//!
//! Command line handling lives in the application layer (asc-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use asc_log_decoder::{CandumpLogWriter, Converter, ConverterConfig};
//! use std::fs::File;
//! use std::io::{self, BufReader};
//! use std::path::Path;
//!
//! let mut converter = Converter::with_config(ConverterConfig::new());
//! converter.add_dbc(Path::new("powertrain.dbc")).unwrap();
//!
//! let trace = BufReader::new(File::open("trace.asc").unwrap());
//! let mut sink = CandumpLogWriter::new(io::stdout().lock());
//!
//! let stats = converter.convert(trace, &mut sink).unwrap();
//! eprintln!("{} frames", stats.frames);
//! ```

// Public modules
pub mod config;
pub mod database;
pub mod decoder;
pub mod formats;
pub mod output;
pub mod types;

// Re-export main types for convenience
pub use config::ConverterConfig;
pub use database::MessageTable;
pub use decoder::Converter;
pub use formats::asc::{AscRecords, ConversionStats};
pub use output::{CandumpLogWriter, RecordSink};
pub use types::{
    CanFrame, CanId, DecoderError, ErrorFrame, OutputRecord, RecordFrame, Result, TimeSpec,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
