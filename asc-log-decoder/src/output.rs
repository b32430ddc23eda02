//! Record output
//!
//! Records are written in the compact log format of the Linux can-utils
//! (`candump -l`, `canplayer`):
//!
//! ```text
//! (1560341168.002367) can0 00000390#17001400C0000800
//! (1560341168.003112) can0 20000080#0000000000000000
//! ```

use crate::types::{
    CanFrame, ErrorFrame, OutputRecord, RecordFrame, CAN_EFF_MASK, CAN_ERR_FLAG, CAN_ERR_MASK,
    CAN_MAX_DLEN, CAN_SFF_MASK,
};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Destination for converted records
pub trait RecordSink {
    fn write_record(&mut self, record: &OutputRecord) -> io::Result<()>;
}

/// Collects records in memory
impl RecordSink for Vec<OutputRecord> {
    fn write_record(&mut self, record: &OutputRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records as candump log lines, flushing after every record so that
/// readers of a pipe see each frame immediately
pub struct CandumpLogWriter<W: Write> {
    writer: W,
}

impl<W: Write> CandumpLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CandumpLogWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", format_record(record))?;
        self.writer.flush()
    }
}

/// `(<sec>.<usec>) <interface> <frame>`
pub fn format_record(record: &OutputRecord) -> String {
    format!(
        "({}) {} {}",
        record.timestamp,
        interface_label(record),
        format_frame(&record.frame)
    )
}

/// `can<N>` for a known channel, `canX` otherwise
pub fn interface_label(record: &OutputRecord) -> String {
    match record.interface_index() {
        Some(index) => format!("can{}", index),
        None => "canX".to_string(),
    }
}

/// `<id>#<data>` in candump notation
pub fn format_frame(frame: &RecordFrame) -> String {
    match frame {
        RecordFrame::Data(frame) => format_data_frame(frame),
        RecordFrame::Error(frame) => format_error_frame(frame),
    }
}

fn format_data_frame(frame: &CanFrame) -> String {
    let mut out = if frame.id.is_extended {
        format!("{:08X}#", frame.id.value & CAN_EFF_MASK)
    } else {
        format!("{:03X}#", frame.id.value & CAN_SFF_MASK)
    };

    if frame.id.is_remote {
        out.push('R');
        if frame.dlc > 0 && usize::from(frame.dlc) <= CAN_MAX_DLEN {
            let _ = write!(out, "{:X}", frame.dlc);
        }
        return out;
    }

    push_hex_bytes(&mut out, frame.payload());
    out
}

fn format_error_frame(frame: &ErrorFrame) -> String {
    let mut out = format!("{:08X}#", frame.can_id & (CAN_ERR_MASK | CAN_ERR_FLAG));
    let len = usize::from(frame.dlc).min(CAN_MAX_DLEN);
    push_hex_bytes(&mut out, &frame.data[..len]);
    out
}

fn push_hex_bytes(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        let _ = write!(out, "{:02X}", byte);
    }
}
