//! asc2log - ASC to candump log converter
//!
//! Command-line front end of the asc-log-decoder library. It adds:
//! - Input/output file selection (stdin/stdout by default)
//! - DBC files for symbolic message names
//! - An optional config.toml
//! - Logging setup

use anyhow::{Context, Result};
use asc_log_decoder::{CandumpLogWriter, Converter, ConverterConfig};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

mod config;

use config::RunSettings;

/// Convert Vector ASC CAN traces into candump log files
#[derive(Parser, Debug)]
#[command(name = "asc2log")]
#[command(about = "Convert ASC CAN traces to compact candump log files", long_about = None)]
#[command(version)]
struct Args {
    /// ASC trace to convert (default: stdin)
    #[arg(short = 'I', long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output log file (default: stdout)
    #[arg(short = 'O', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// DBC file(s) with message names used as identifiers (can be repeated)
    #[arg(short = 'D', long = "dbc", value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Write the timestamps found in the trace without conversion
    #[arg(short = 'r', long)]
    raw_time: bool,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all diagnostics
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn settings(&self) -> RunSettings {
        RunSettings {
            input: self.input.clone(),
            output: self.output.clone(),
            dbc_files: self.dbc.clone(),
            raw_time: self.raw_time,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut settings = args.settings();
    if let Some(config_path) = &args.config {
        let file_config = config::load_config(config_path)?;
        settings = RunSettings::merge(settings, file_config);
    }

    // Initialize logging
    init_logging(settings.verbose, settings.quiet);

    log::info!("asc2log v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", asc_log_decoder::VERSION);

    run(&settings)
}

/// Load the DBC files, then convert the trace
fn run(settings: &RunSettings) -> Result<()> {
    let config = ConverterConfig::new().with_raw_timestamps(settings.raw_time);
    let mut converter = Converter::with_config(config);

    for dbc_path in &settings.dbc_files {
        converter
            .add_dbc(dbc_path)
            .with_context(|| format!("Failed to load DBC file: {:?}", dbc_path))?;
    }
    if !settings.dbc_files.is_empty() {
        log::info!(
            "Message names available: {}",
            converter.message_table().len()
        );
        for (name, id) in converter.message_table().entries() {
            log::debug!("  {:>10} {}", id, name);
        }
    }

    let input: Box<dyn BufRead> = match &settings.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {:?}", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let output: Box<dyn Write> = match &settings.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut sink = CandumpLogWriter::new(output);
    converter
        .convert(input, &mut sink)
        .context("Conversion aborted")?;

    Ok(())
}

/// Initialize logging based on verbosity level
///
/// Diagnostics go to stderr; stdout may carry the converted log.
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Off
    } else {
        match verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
