//! Capture file format loaders
//!
//! This module contains loaders for the text exports produced by logic analyzers.
//! Each loader turns a capture into the ordered list of SCL/SDA samples the
//! bus decoder consumes.

use crate::config::DecoderConfig;
use crate::types::{Result, Sample};
use std::fs;
use std::path::Path;

pub mod ila_csv;

// Re-export loader types
pub use ila_csv::{find_column, IlaCsv};

/// Common trait for all capture formats
///
/// Loading is a pure read: the same file can be loaded any number of times and
/// always yields the same samples in the same order.
pub trait TraceFormat {
    /// Parse capture text that has already been read into memory
    fn parse_str(text: &str, config: &DecoderConfig) -> Result<Vec<Sample>>;

    /// Read a capture file and return its samples in capture order
    fn load(path: &Path, config: &DecoderConfig) -> Result<Vec<Sample>> {
        log::info!("Loading trace: {:?}", path);
        let text = fs::read_to_string(path)?;
        let samples = Self::parse_str(&text, config)?;
        log::info!("Loaded {} samples from {:?}", samples.len(), path);
        Ok(samples)
    }
}
