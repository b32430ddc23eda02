//! Trace format readers
//!
//! Each reader turns the lines of one trace format into output records.

pub mod asc;
