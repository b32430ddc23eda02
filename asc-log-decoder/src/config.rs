//! Converter configuration types
//!
//! The converter needs very little configuration: the trace header tells it
//! how to read the data lines. Input/output selection belongs to the
//! application layer.

use serde::{Deserialize, Serialize};

/// Configuration for the converter library
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Emit each line's own timestamp without scaling or accumulation
    #[serde(default)]
    pub raw_timestamps: bool,
}

impl ConverterConfig {
    /// Create a new converter configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable raw timestamp pass-through
    pub fn with_raw_timestamps(mut self, enabled: bool) -> Self {
        self.raw_timestamps = enabled;
        self
    }
}
