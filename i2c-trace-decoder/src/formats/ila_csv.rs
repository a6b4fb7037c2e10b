//! Integrated logic analyzer CSV export
//!
//! The export is a plain comma-separated table. The first row names the
//! captured signals, usually with the full hierarchical path of the net (for
//! example `soc_i/i_i2c_scl_rx_1`), and every following row is one sample.
//!
//! ## Layout
//! - Row 1: header, free-form column names
//! - Rows 2..N: integer sample values, one column per signal
//! - Some tool versions add a `Radix - ...` row with display metadata; it holds
//!   no sample and is skipped
//!
//! Columns are selected by suffix so that callers can pass the short net name
//! and stay independent of the instance path the tool prepended.

use super::TraceFormat;
use crate::config::DecoderConfig;
use crate::types::{DecoderError, Result, Sample};

/// Loader for comma-separated logic analyzer exports
pub struct IlaCsv;

/// Find the header column whose trimmed name ends with `name`
///
/// When several columns match, the last one wins.
pub fn find_column<'a, I>(header: I, name: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    header
        .into_iter()
        .enumerate()
        .filter(|(_, title)| title.trim().ends_with(name))
        .map(|(idx, _)| idx)
        .last()
}

fn parse_level(fields: &[&str], column: usize, line: usize) -> Result<i64> {
    let raw = fields
        .get(column)
        .ok_or(DecoderError::MissingColumn { line, column })?;

    raw.trim()
        .parse::<i64>()
        .map_err(|_| DecoderError::InvalidSample {
            line,
            column,
            value: raw.trim().to_string(),
        })
}

impl TraceFormat for IlaCsv {
    fn parse_str(text: &str, config: &DecoderConfig) -> Result<Vec<Sample>> {
        config.validate()?;

        let mut lines = text.lines();
        let header = lines.next().ok_or(DecoderError::EmptyTrace)?;
        let columns: Vec<&str> = header.split(config.delimiter).collect();

        let clock_idx = find_column(columns.iter().copied(), &config.clock_signal)
            .ok_or_else(|| DecoderError::SignalNotFound(config.clock_signal.clone()))?;
        let data_idx = find_column(columns.iter().copied(), &config.data_signal)
            .ok_or_else(|| DecoderError::SignalNotFound(config.data_signal.clone()))?;

        log::debug!(
            "Clock signal {:?} -> column {}, data signal {:?} -> column {}",
            config.clock_signal,
            clock_idx,
            config.data_signal,
            data_idx
        );

        // Trailing blank lines are end-of-file padding; blank rows before that
        // are malformed samples
        let rows: Vec<&str> = lines.collect();
        let end = rows
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |idx| idx + 1);

        let mut samples = Vec::new();
        // Header is line 1
        for (line_no, line) in (2..).zip(&rows[..end]) {
            if line.trim_start().starts_with(config.skip_marker.as_str()) {
                log::trace!("Skipping marker row at line {}", line_no);
                continue;
            }

            let fields: Vec<&str> = line.split(config.delimiter).collect();
            let clock = parse_level(&fields, clock_idx, line_no)?;
            let data = parse_level(&fields, data_idx, line_no)?;
            samples.push(Sample::from_levels(clock, data));
        }

        Ok(samples)
    }
}
