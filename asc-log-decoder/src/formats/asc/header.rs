//! ASC header calibration
//!
//! Data lines cannot be read before the header has told us three things:
//!
//! - the numeric base of identifiers and data bytes (`base hex|dec`)
//! - whether timestamps are absolute or relative (`timestamps absolute|relative`)
//! - how many fractional digits a timestamp carries (taken from the first data line)
//!
//! The measurement start (`date ...`) is optional and may appear before or
//! after the base line.

use super::date;
use crate::types::{DecoderError, Result, TimeSpec};
use std::fmt;

/// Radix of identifiers and data bytes in the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericBase {
    Hex,
    Dec,
}

impl NumericBase {
    /// `hex...` or `dec...`/`dez...`; only the first character counts
    pub fn from_token(token: &str) -> Option<Self> {
        match token.chars().next()? {
            'h' => Some(NumericBase::Hex),
            'd' => Some(NumericBase::Dec),
            _ => None,
        }
    }

    pub fn radix(self) -> u32 {
        match self {
            NumericBase::Hex => 16,
            NumericBase::Dec => 10,
        }
    }
}

impl fmt::Display for NumericBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericBase::Hex => write!(f, "hex"),
            NumericBase::Dec => write!(f, "dec"),
        }
    }
}

/// How data line timestamps relate to the measurement start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// Offset from the measurement start
    Absolute,
    /// Offset from the previous line
    Relative,
}

impl TimestampMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.chars().next()? {
            'a' => Some(TimestampMode::Absolute),
            'r' => Some(TimestampMode::Relative),
            _ => None,
        }
    }
}

impl fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampMode::Absolute => write!(f, "absolute"),
            TimestampMode::Relative => write!(f, "relative"),
        }
    }
}

/// Number of fractional digits in data line timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalPlaces {
    Four,
    Five,
    Six,
}

impl DecimalPlaces {
    pub fn from_digits(digits: usize) -> Option<Self> {
        match digits {
            4 => Some(DecimalPlaces::Four),
            5 => Some(DecimalPlaces::Five),
            6 => Some(DecimalPlaces::Six),
            _ => None,
        }
    }

    pub fn digits(self) -> usize {
        match self {
            DecimalPlaces::Four => 4,
            DecimalPlaces::Five => 5,
            DecimalPlaces::Six => 6,
        }
    }

    /// Factor turning the fractional part into microseconds
    pub fn micros_scale(self) -> u32 {
        match self {
            DecimalPlaces::Four => 100,
            DecimalPlaces::Five => 10,
            DecimalPlaces::Six => 1,
        }
    }
}

/// Progress of header calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    AwaitingBaseLine,
    AwaitingDateLine,
    CalibratingDecimalPlaces,
    Ready,
}

/// Format parameters learned so far. Every field goes from unset to set
/// exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserCalibration {
    pub base: Option<NumericBase>,
    pub timestamp_mode: Option<TimestampMode>,
    pub decimal_places: Option<DecimalPlaces>,
    pub session_date: Option<TimeSpec>,
}

impl ParserCalibration {
    /// Frozen parameters, available once base, mode and decimal places are known
    pub fn complete(&self) -> Option<Calibration> {
        Some(Calibration {
            base: self.base?,
            timestamp_mode: self.timestamp_mode?,
            decimal_places: self.decimal_places?,
            session_date: self.session_date,
        })
    }
}

/// Complete set of parameters used to read data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub base: NumericBase,
    pub timestamp_mode: TimestampMode,
    pub decimal_places: DecimalPlaces,
    session_date: Option<TimeSpec>,
}

impl Calibration {
    pub fn new(
        base: NumericBase,
        timestamp_mode: TimestampMode,
        decimal_places: DecimalPlaces,
        session_date: Option<TimeSpec>,
    ) -> Self {
        Self {
            base,
            timestamp_mode,
            decimal_places,
            session_date,
        }
    }

    /// Measurement start. A trace without a `date` line starts at the moment
    /// the start is first needed.
    pub fn session_date(&mut self) -> TimeSpec {
        *self.session_date.get_or_insert_with(|| {
            log::warn!("No date found in header. Using current time.");
            TimeSpec::now()
        })
    }
}

/// Consumes header lines until the trace format is known
#[derive(Debug, Clone, Default)]
pub struct HeaderDetector {
    calibration: ParserCalibration,
}

impl HeaderDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn what `line` tells about the trace format
    ///
    /// Lines that carry nothing useful leave the state unchanged. An invalid
    /// base, timestamp mode or decimal place count is fatal.
    pub fn feed(&mut self, line: &str) -> Result<HeaderState> {
        if self.calibration.base.is_none() {
            if let Some((base_token, mode_token)) = base_line_tokens(line) {
                let base = NumericBase::from_token(base_token)
                    .ok_or_else(|| DecoderError::InvalidBase(base_token.to_string()))?;
                let mode = TimestampMode::from_token(mode_token)
                    .ok_or_else(|| DecoderError::InvalidTimestampMode(mode_token.to_string()))?;

                log::info!("base {} timestamps {}", base, mode);
                self.calibration.base = Some(base);
                self.calibration.timestamp_mode = Some(mode);
                return Ok(self.state());
            }
        }

        if self.calibration.session_date.is_none() && date::is_date_line(line) {
            let session_date = date::session_date_from_line(line).unwrap_or_else(|| {
                log::warn!("Not able to determine original log file date. Using current time.");
                TimeSpec::now()
            });

            log::info!("date {} => {}", session_date.seconds, describe_epoch(session_date));
            self.calibration.session_date = Some(session_date);
            return Ok(self.state());
        }

        if self.calibration.base.is_some() && self.calibration.decimal_places.is_none() {
            if let Some(fraction) = fraction_token(line) {
                let digits = fraction.chars().count();
                let places = DecimalPlaces::from_digits(digits)
                    .ok_or(DecoderError::InvalidDecimalPlaces(digits))?;

                log::debug!("decimal place {}, e.g. '{}'", places.digits(), fraction);
                self.calibration.decimal_places = Some(places);
            }
        }

        Ok(self.state())
    }

    pub fn state(&self) -> HeaderState {
        let c = &self.calibration;
        if c.base.is_none() || c.timestamp_mode.is_none() {
            HeaderState::AwaitingBaseLine
        } else if c.decimal_places.is_some() {
            HeaderState::Ready
        } else if c.session_date.is_none() {
            HeaderState::AwaitingDateLine
        } else {
            HeaderState::CalibratingDecimalPlaces
        }
    }

    pub fn calibration(&self) -> &ParserCalibration {
        &self.calibration
    }
}

/// `base <token> timestamps <token>`
fn base_line_tokens(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "base" {
        return None;
    }
    let base = parts.next()?;
    if parts.next()? != "timestamps" {
        return None;
    }
    let mode = parts.next()?;
    Some((base, mode))
}

/// Fractional part of a line shaped like `<seconds>.<fraction> <integer> ...`
fn fraction_token(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    let (seconds, fraction) = parts.next()?.split_once('.')?;
    seconds.parse::<i64>().ok()?;
    parts.next()?.parse::<i32>().ok()?;
    if fraction.is_empty() {
        return None;
    }
    Some(fraction)
}

fn describe_epoch(date: TimeSpec) -> String {
    use chrono::{Local, TimeZone};

    match Local.timestamp_opt(date.seconds, 0).single() {
        Some(local) => local.format("%a %b %e %H:%M:%S %Y").to_string(),
        None => "invalid date".to_string(),
    }
}
