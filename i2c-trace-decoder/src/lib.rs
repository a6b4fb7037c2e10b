//! I2C Trace Decoder Library
//!
//! A stateless, reusable library for reconstructing I2C bus transactions from
//! edge-triggered logic analyzer captures of SCL and SDA.
//!
//! # Architecture
//!
//! Decoding is a two-stage pipeline:
//! - The trace loader reads a comma-separated capture export, selects the SCL
//!   and SDA columns by name suffix and produces an ordered list of samples
//! - The bus decoder folds over the samples and emits every transaction that
//!   was closed by a STOP condition
//!
//! Only the order of samples matters; no timestamps are used. A transaction
//! still open when the capture ends is dropped.
//!
//! The library does NOT:
//! - Validate electrical timing or filter glitches
//! - Analyze clock stretching or multi-master arbitration
//! - Decode 10-bit addresses
//!
//! Report generation and trace comparison live in the application layer
//! (i2c-trace-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use i2c_trace_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! let config = DecoderConfig::new()
//!     .with_signals("soc_i/i_i2c_scl_rx_1", "soc_i/i_i2c_sda_rx_1");
//! let decoder = Decoder::new(config);
//!
//! let transactions = decoder.decode_file(Path::new("capture.csv")).unwrap();
//! for transaction in transactions.iter().filter(|t| t.is_addressed_to(0x26)) {
//!     println!("{}", transaction);
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod formats;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{decode, decode_with_stats, Condition, DecodeStats, Decoder, DecoderState, Step};
pub use formats::{IlaCsv, TraceFormat};
pub use types::{BusEvent, DataByte, DecoderError, Direction, Result, Sample, Transaction};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
