//! Core types for the ASC log decoder library
//!
//! This module defines the values the converter produces for every recognised
//! trace line: timestamps with microsecond resolution, CAN identifiers with their
//! flag bits, data and error frames, and the output record that bundles them.

use chrono::Utc;
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Extended frame format flag (29-bit identifier)
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;
/// Remote transmission request flag
pub const CAN_RTR_FLAG: u32 = 0x4000_0000;
/// Error message frame flag
pub const CAN_ERR_FLAG: u32 = 0x2000_0000;

/// Standard frame format identifier mask (11 bits)
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;
/// Extended frame format identifier mask (29 bits)
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;
/// Error class mask for error frames
pub const CAN_ERR_MASK: u32 = 0x1FFF_FFFF;

/// Error class: bus error (may flood)
pub const CAN_ERR_BUSERROR: u32 = 0x0000_0080;
/// Payload length of an error frame
pub const CAN_ERR_DLC: u8 = 8;

/// Maximum payload of a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("invalid base '{0}' (must be 'hex' or 'dec')")]
    InvalidBase(String),

    #[error("invalid timestamps '{0}' (must be 'absolute' or 'relative')")]
    InvalidTimestampMode(String),

    #[error("invalid decimal place count {0} (must be 4, 5 or 6)")]
    InvalidDecimalPlaces(usize),

    #[error("Failed to read DBC file: {0}")]
    DbcParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Seconds and microseconds, the timestamp resolution of the output log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpec {
    pub seconds: i64,
    /// Kept in `0..1_000_000` by every arithmetic step
    pub microseconds: u32,
}

impl TimeSpec {
    pub const ZERO: TimeSpec = TimeSpec {
        seconds: 0,
        microseconds: 0,
    };

    pub fn new(seconds: i64, microseconds: u32) -> Self {
        Self {
            seconds,
            microseconds,
        }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp(),
            microseconds: now.timestamp_subsec_micros().min(MICROS_PER_SECOND - 1),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.microseconds == 0
    }

    /// Component-wise addition followed by a single microsecond carry.
    ///
    /// Both operands are expected to carry fewer than one million microseconds,
    /// so one correction is always enough.
    pub fn add_normalized(self, other: TimeSpec) -> TimeSpec {
        TimeSpec {
            seconds: self.seconds.saturating_add(other.seconds),
            microseconds: self.microseconds.saturating_add(other.microseconds),
        }
        .normalized()
    }

    fn normalized(mut self) -> TimeSpec {
        if self.microseconds >= MICROS_PER_SECOND {
            self.microseconds -= MICROS_PER_SECOND;
            self.seconds = self.seconds.saturating_add(1);
        }
        self
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.seconds, self.microseconds)
    }
}

/// CAN identifier together with its frame format flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CanId {
    /// Identifier value (11-bit or 29-bit)
    pub value: u32,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// True if this is a remote frame
    pub is_remote: bool,
}

impl CanId {
    pub fn standard(value: u32) -> Self {
        Self {
            value,
            is_extended: false,
            is_remote: false,
        }
    }

    pub fn extended(value: u32) -> Self {
        Self {
            value: value & CAN_EFF_MASK,
            is_extended: true,
            is_remote: false,
        }
    }

    /// Interpret an identifier as stored in a database, where bit 31 marks
    /// an extended id
    pub fn from_database(raw: u32) -> Self {
        if raw & CAN_EFF_FLAG != 0 {
            Self::extended(raw)
        } else {
            Self::standard(raw & CAN_EFF_MASK)
        }
    }

    /// Linux `canid_t` encoding: identifier bits plus EFF/RTR flags
    pub fn raw(&self) -> u32 {
        let mut raw = self.value & CAN_EFF_MASK;
        if self.is_extended {
            raw |= CAN_EFF_FLAG;
        }
        if self.is_remote {
            raw |= CAN_RTR_FLAG;
        }
        raw
    }
}

/// Classic CAN data or remote frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    pub id: CanId,
    /// Data length code, masked to 4 bits
    pub dlc: u8,
    pub data: [u8; CAN_MAX_DLEN],
}

impl CanFrame {
    /// Payload bytes covered by the DLC
    pub fn payload(&self) -> &[u8] {
        let len = usize::from(self.dlc).min(CAN_MAX_DLEN);
        &self.data[..len]
    }
}

/// Synthetic error frame for an `ErrorFrame` trace line.
///
/// ASC traces carry no detail about the error, so every frame reports a
/// generic bus error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    /// Error flag plus error class bits
    pub can_id: u32,
    pub dlc: u8,
    pub data: [u8; CAN_MAX_DLEN],
}

impl ErrorFrame {
    pub fn bus_error() -> Self {
        Self {
            can_id: CAN_ERR_FLAG | CAN_ERR_BUSERROR,
            dlc: CAN_ERR_DLC,
            data: [0; CAN_MAX_DLEN],
        }
    }
}

/// Frame carried by an output record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFrame {
    Data(CanFrame),
    Error(ErrorFrame),
}

/// One converted trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub timestamp: TimeSpec,
    /// Channel number as written in the trace (1-based); zero or negative
    /// means the interface is unknown
    pub interface: i32,
    pub frame: RecordFrame,
}

impl OutputRecord {
    /// Zero-based interface number, `None` when the channel is unknown
    pub fn interface_index(&self) -> Option<u32> {
        u32::try_from(self.interface)
            .ok()
            .and_then(|channel| channel.checked_sub(1))
    }

    pub fn is_error_frame(&self) -> bool {
        matches!(self.frame, RecordFrame::Error(_))
    }
}
