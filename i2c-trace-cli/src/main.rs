//! I2C Trace CLI Application
//!
//! This is the command-line interface for the I2C trace decoder.
//! It uses the i2c-trace-decoder library and adds:
//! - TOML configuration files with command-line overrides
//! - Parallel decoding of several capture files
//! - Filtering by device address
//! - Trace comparison (optionally ignoring ACK/NACK)
//! - Report generation (TXT/JSON)

use anyhow::{Context, Result};
use clap::Parser;
use i2c_trace_decoder::Decoder;
use rayon::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod compare;
mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::TraceReport;

/// I2C Trace - Decode I2C transactions from logic analyzer captures
#[derive(Parser, Debug)]
#[command(name = "i2c-trace")]
#[command(about = "Decode I2C bus transactions from SCL/SDA capture exports (CSV)", long_about = None)]
#[command(version)]
struct Args {
    /// Capture file(s) to decode (can be repeated)
    #[arg(short, long = "trace", value_name = "FILE")]
    traces: Vec<PathBuf>,

    /// Clock signal name, matched against the end of the header column
    #[arg(long, value_name = "NAME")]
    scl: Option<String>,

    /// Data signal name, matched against the end of the header column
    #[arg(long, value_name = "NAME")]
    sda: Option<String>,

    /// Only report transactions to this 7-bit address (e.g. 0x26)
    #[arg(short, long, value_name = "ADDR", value_parser = config::parse_address)]
    address: Option<u8>,

    /// Leave ACK/NACK out of text output and comparisons
    #[arg(long)]
    ignore_ack: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Compare the decoded trace against this capture instead of printing it
    #[arg(long, value_name = "FILE")]
    compare: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("I2C Trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", i2c_trace_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    if config.input.files.is_empty() {
        println!("I2C Trace - No input specified");
        println!("\nQuick Start:");
        println!("  i2c-trace --trace capture.csv --scl scl_rx --sda sda_rx");
        println!("  i2c-trace --trace capture.csv --address 0x26 --ignore-ack");
        println!("  i2c-trace --trace a.csv --compare b.csv --ignore-ack");
        println!("\nOr with a configuration file:");
        println!("  i2c-trace --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let decoder_config = config.decoder_config();
    decoder_config.validate()?;
    let decoder = Decoder::new(decoder_config);

    match &args.compare {
        Some(other) => compare_mode(&decoder, &config, other),
        None => decode_mode(&decoder, &config),
    }
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if !args.traces.is_empty() {
        config.input.files = args.traces.clone();
    }
    if let Some(scl) = &args.scl {
        config.signals.clock = scl.clone();
    }
    if let Some(sda) = &args.sda {
        config.signals.data = sda.clone();
    }
    if args.address.is_some() {
        config.filtering.address = args.address;
    }
    if args.ignore_ack {
        config.output.ignore_ack = true;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.output.is_some() {
        config.output.file = args.output.clone();
    }
}

fn decode_trace(decoder: &Decoder, path: &Path) -> Result<TraceReport> {
    let (transactions, stats) = decoder
        .decode_file_with_stats(path)
        .with_context(|| format!("Failed to decode trace: {:?}", path))?;
    if stats.dropped_open {
        log::warn!("{:?} ends inside a transaction; it was dropped", path);
    }
    Ok(TraceReport::new(path.to_path_buf(), transactions, stats))
}

/// Decode every input file (in parallel) and write the report
fn decode_mode(decoder: &Decoder, config: &AppConfig) -> Result<()> {
    let mut reports = config
        .input
        .files
        .par_iter()
        .map(|path| decode_trace(decoder, path))
        .collect::<Result<Vec<_>>>()?;

    if let Some(address) = config.filtering.address {
        log::debug!("Filtering transactions for address 0x{:02x}", address);
        for report in &mut reports {
            report.retain_address(address);
        }
    }

    let now = chrono::Utc::now();
    let rendered = match config.output.format {
        OutputFormat::Txt => report::render_txt(&reports, config.output.ignore_ack, now)?,
        OutputFormat::Json => {
            if config.output.ignore_ack {
                log::warn!("--ignore-ack only applies to text output; JSON keeps ack fields");
            }
            report::render_json(&reports, now)?
        }
    };

    match &config.output.file {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Decode one input file and a reference capture, then compare them
fn compare_mode(decoder: &Decoder, config: &AppConfig, other: &Path) -> Result<()> {
    anyhow::ensure!(
        config.input.files.len() == 1,
        "--compare needs exactly one --trace, got {}",
        config.input.files.len()
    );
    let first = &config.input.files[0];

    let (left, right) = rayon::join(
        || decode_trace(decoder, first),
        || decode_trace(decoder, other),
    );
    let (mut left, mut right) = (left?, right?);

    if let Some(address) = config.filtering.address {
        left.retain_address(address);
        right.retain_address(address);
    }

    let result = compare::compare(
        &left.transactions,
        &right.transactions,
        config.output.ignore_ack,
    );
    println!("{}", result);

    anyhow::ensure!(
        result.is_match(),
        "{:?} and {:?} decode to different transactions",
        first,
        other
    );
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
