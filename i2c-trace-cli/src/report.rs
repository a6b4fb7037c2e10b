//! Report generation
//!
//! Renders decoded traces as a plain-text listing or as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use i2c_trace_decoder::{DecodeStats, Transaction};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Decoding result of one capture file
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub file: PathBuf,
    pub stats: DecodeStats,
    pub transactions: Vec<Transaction>,
}

impl TraceReport {
    pub fn new(file: PathBuf, transactions: Vec<Transaction>, stats: DecodeStats) -> Self {
        Self {
            file,
            stats,
            transactions,
        }
    }

    /// Keep only the transactions that addressed `address`
    pub fn retain_address(&mut self, address: u8) {
        self.transactions.retain(|t| t.is_addressed_to(address));
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    decoder_version: &'static str,
    traces: &'a [TraceReport],
}

fn write_summary(out: &mut String, report: &TraceReport, ignore_ack: bool) -> fmt::Result {
    let stats = &report.stats;
    writeln!(out, "--- Summary ---")?;
    writeln!(out, "  Samples:         {}", stats.samples)?;
    writeln!(out, "  Transactions:    {}", stats.transactions)?;
    writeln!(out, "  Shown:           {}", report.transactions.len())?;
    writeln!(out, "  Repeated starts: {}", stats.repeated_starts)?;
    // NACK count is acknowledge data too
    if !ignore_ack {
        writeln!(out, "  NACKs:           {}", stats.nacks)?;
    }
    if stats.dropped_open {
        writeln!(out, "  Capture ended inside a transaction (dropped)")?;
    }
    Ok(())
}

fn write_txt(
    out: &mut String,
    reports: &[TraceReport],
    ignore_ack: bool,
    generated_at: DateTime<Utc>,
) -> fmt::Result {
    writeln!(
        out,
        "I2C trace report ({})",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    for report in reports {
        writeln!(out, "\n=== {} ===", report.file.display())?;
        for (idx, transaction) in report.transactions.iter().enumerate() {
            writeln!(out, "[{}] {}", idx, transaction.render(ignore_ack))?;
        }
        write_summary(out, report, ignore_ack)?;
    }
    Ok(())
}

/// Render all traces as text, one block per transaction
///
/// With `ignore_ack` nothing acknowledge-related is printed, so two captures
/// that differ only in ACK bits render identically.
pub fn render_txt(
    reports: &[TraceReport],
    ignore_ack: bool,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let mut out = String::new();
    write_txt(&mut out, reports, ignore_ack, generated_at).context("Failed to format text report")?;
    Ok(out)
}

/// Render all traces as a pretty-printed JSON document
///
/// JSON is the complete decoded record: acknowledge flags and NACK counts are
/// always included, whatever the ack-insensitive setting of the text output.
pub fn render_json(reports: &[TraceReport], generated_at: DateTime<Utc>) -> Result<String> {
    let report = JsonReport {
        generated_at,
        decoder_version: i2c_trace_decoder::VERSION,
        traces: reports,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
}
