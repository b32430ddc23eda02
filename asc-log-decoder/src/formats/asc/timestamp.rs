//! Output timestamp calculation
//!
//! A data line timestamp is `<seconds>.<fraction>` with 4 to 6 fractional
//! digits. It is scaled to microseconds and then either added to the session
//! start (absolute traces) or accumulated (relative traces).

use super::header::{DecimalPlaces, TimestampMode};
use crate::types::TimeSpec;

/// Bring the fractional part of a line timestamp to microseconds
pub fn scale_to_micros(raw: TimeSpec, decimal_places: DecimalPlaces) -> TimeSpec {
    TimeSpec {
        seconds: raw.seconds,
        microseconds: raw
            .microseconds
            .saturating_mul(decimal_places.micros_scale()),
    }
}

/// Compute the output timestamp of one line
///
/// `accumulator` is the only state carried from line to line. It is used by
/// relative traces only: the first call seeds it from `session_date` (when
/// the session date is known), every call adds the line's offset and returns
/// the running total.
pub fn compute(
    accumulator: &mut TimeSpec,
    raw: TimeSpec,
    session_date: TimeSpec,
    mode: TimestampMode,
    decimal_places: DecimalPlaces,
) -> TimeSpec {
    let offset = scale_to_micros(raw, decimal_places);

    match mode {
        TimestampMode::Absolute => session_date.add_normalized(offset),
        TimestampMode::Relative => {
            if accumulator.is_zero() && !session_date.is_zero() {
                *accumulator = session_date;
            }
            *accumulator = accumulator.add_normalized(offset);
            *accumulator
        }
    }
}
