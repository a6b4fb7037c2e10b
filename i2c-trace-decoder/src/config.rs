//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! which capture columns carry SCL and SDA and how the export is laid out.
//! Output selection (filters, report formats) is handled by the application layer.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the trace loader and decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Suffix of the header column holding the clock (SCL) signal
    #[serde(default = "default_clock_signal")]
    pub clock_signal: String,

    /// Suffix of the header column holding the data (SDA) signal
    #[serde(default = "default_data_signal")]
    pub data_signal: String,

    /// Rows starting with this marker carry display metadata and are skipped
    #[serde(default = "default_skip_marker")]
    pub skip_marker: String,

    /// Field separator of the capture export
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_clock_signal() -> String {
    "scl".to_string()
}

fn default_data_signal() -> String {
    "sda".to_string()
}

fn default_skip_marker() -> String {
    "Radix".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            clock_signal: default_clock_signal(),
            data_signal: default_data_signal(),
            skip_marker: default_skip_marker(),
            delimiter: default_delimiter(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the clock signal name
    pub fn with_clock_signal(mut self, name: impl Into<String>) -> Self {
        self.clock_signal = name.into();
        self
    }

    /// Builder method: set the data signal name
    pub fn with_data_signal(mut self, name: impl Into<String>) -> Self {
        self.data_signal = name.into();
        self
    }

    /// Builder method: set both signal names at once
    pub fn with_signals(self, clock: impl Into<String>, data: impl Into<String>) -> Self {
        self.with_clock_signal(clock).with_data_signal(data)
    }

    /// Builder method: set the marker of rows to skip
    pub fn with_skip_marker(mut self, marker: impl Into<String>) -> Self {
        self.skip_marker = marker.into();
        self
    }

    /// Builder method: set the field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Check that the configuration can select columns at all
    ///
    /// An empty signal name would suffix-match every header column.
    pub fn validate(&self) -> Result<()> {
        if self.clock_signal.trim().is_empty() {
            return Err(DecoderError::ConfigError(
                "clock signal name is empty".to_string(),
            ));
        }
        if self.data_signal.trim().is_empty() {
            return Err(DecoderError::ConfigError(
                "data signal name is empty".to_string(),
            ));
        }
        Ok(())
    }
}
