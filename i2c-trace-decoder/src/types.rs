//! Core types for the I2C trace decoder library
//!
//! This module defines the sampled signal levels consumed by the decoder and the
//! bus events and transactions it emits. Transactions are built up by the decoder
//! and handed out read-only once their STOP condition has been seen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// One captured instant of the two I2C lines
///
/// Samples carry no timestamp. Capture order is the only notion of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    /// SCL level (true = high)
    pub clock: bool,
    /// SDA level (true = high)
    pub data: bool,
}

impl Sample {
    /// Create a sample from boolean levels
    pub fn new(clock: bool, data: bool) -> Self {
        Self { clock, data }
    }

    /// Create a sample from integer levels as found in capture exports (non-zero = high)
    pub fn from_levels(clock: i64, data: i64) -> Self {
        Self {
            clock: clock != 0,
            data: data != 0,
        }
    }
}

/// Transfer direction encoded in the R/W bit of an address byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// R/W bit = 0
    #[default]
    Write,
    /// R/W bit = 1
    Read,
}

impl Direction {
    /// Interpret the least significant bit of an address byte
    pub fn from_rw_bit(byte: u8) -> Self {
        if byte & 0x01 == 0 {
            Direction::Write
        } else {
            Direction::Read
        }
    }

    /// Short mnemonic used in rendered transactions
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Direction::Write => "WR",
            Direction::Read => "RD",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One logical event observed on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusEvent {
    /// START condition while the bus was idle
    Start,
    /// START condition inside a running transaction
    RepeatedStart,
    /// STOP condition closing the transaction
    Stop,
    /// First byte after a (repeated) START: 7-bit address plus R/W bit
    AddressPhase {
        address: u8,
        direction: Direction,
        ack: bool,
    },
    /// Any byte after the address byte
    DataPhase { value: u8, ack: bool },
}

fn ack_token(ack: bool) -> &'static str {
    if ack {
        "ACK"
    } else {
        "NACK"
    }
}

impl BusEvent {
    /// Render the event as a one-line mnemonic
    ///
    /// With `ignore_ack` the trailing ACK/NACK token is left out, which makes
    /// renderings comparable when acknowledge glitches are not of interest.
    pub fn render(&self, ignore_ack: bool) -> String {
        let (text, ack) = match self {
            BusEvent::Start => return "START".to_string(),
            BusEvent::RepeatedStart => return "REPEATED START".to_string(),
            BusEvent::Stop => return "STOP".to_string(),
            BusEvent::AddressPhase {
                address,
                direction,
                ack,
            } => (format!("ADDR: 0x{:x} {}", address, direction), *ack),
            BusEvent::DataPhase { value, ack } => (format!("DATA: 0x{:02x}", value), *ack),
        };

        if ignore_ack {
            text
        } else {
            format!("{} {}", text, ack_token(ack))
        }
    }

    /// Acknowledge flag of address and data phases
    pub fn ack(&self) -> Option<bool> {
        match self {
            BusEvent::AddressPhase { ack, .. } | BusEvent::DataPhase { ack, .. } => Some(*ack),
            _ => None,
        }
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// A data byte together with the acknowledge bit that followed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataByte {
    pub value: u8,
    pub ack: bool,
}

/// One bus operation, from START to the matching STOP
///
/// Repeated starts do not open a new transaction; they append a
/// [`BusEvent::RepeatedStart`] and the next byte is read as a fresh address.
/// The cached address fields always describe the most recent address phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    events: Vec<BusEvent>,
    address: u8,
    direction: Direction,
    addr_ack: bool,
    data: Vec<DataByte>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_start(&mut self) {
        self.events.push(BusEvent::Start);
    }

    pub(crate) fn push_repeated_start(&mut self) {
        self.events.push(BusEvent::RepeatedStart);
    }

    pub(crate) fn push_stop(&mut self) {
        self.events.push(BusEvent::Stop);
    }

    pub(crate) fn push_address(&mut self, address: u8, direction: Direction, ack: bool) {
        self.events.push(BusEvent::AddressPhase {
            address,
            direction,
            ack,
        });
        self.address = address;
        self.direction = direction;
        self.addr_ack = ack;
    }

    pub(crate) fn push_data(&mut self, value: u8, ack: bool) {
        self.events.push(BusEvent::DataPhase { value, ack });
        self.data.push(DataByte { value, ack });
    }

    /// All bus events in arrival order
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// 7-bit address of the most recent address phase (0 if none was seen)
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Direction of the most recent address phase
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Acknowledge of the most recent address phase
    pub fn addr_ack(&self) -> bool {
        self.addr_ack
    }

    /// Data bytes with their acknowledge flags
    pub fn data_bytes(&self) -> &[DataByte] {
        &self.data
    }

    /// Data byte values in capture order
    pub fn data(&self) -> Vec<u8> {
        self.data.iter().map(|b| b.value).collect()
    }

    /// Per-byte acknowledge flags in capture order
    pub fn data_ack(&self) -> Vec<bool> {
        self.data.iter().map(|b| b.ack).collect()
    }

    /// True if the transaction contains at least one repeated START
    pub fn has_repeated_start(&self) -> bool {
        self.events.contains(&BusEvent::RepeatedStart)
    }

    /// True if any address phase of this transaction targeted `address`
    pub fn is_addressed_to(&self, address: u8) -> bool {
        self.events.iter().any(|event| {
            matches!(event, BusEvent::AddressPhase { address: a, .. } if *a == address)
        })
    }

    /// Number of address and data phases that were not acknowledged
    pub fn nack_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.ack() == Some(false))
            .count()
    }

    /// Render the transaction, one event per line
    ///
    /// Continuation lines are indented by two spaces so that several
    /// transactions printed back to back remain easy to tell apart.
    pub fn render(&self, ignore_ack: bool) -> String {
        self.events
            .iter()
            .map(|event| event.render(ignore_ack))
            .collect::<Vec<_>>()
            .join("\n  ")
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Errors that can occur while loading or decoding a trace
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Invalid sample value {value:?} at line {line}, column {column}")]
    InvalidSample {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Missing column {column} at line {line}")]
    MissingColumn { line: usize, column: usize },

    #[error("Trace has no header row")]
    EmptyTrace,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
