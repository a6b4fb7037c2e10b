//! Standalone capture decoding tool
//!
//! Loads a logic analyzer CSV export, decodes the I2C traffic on the given
//! SCL/SDA columns and prints every completed transaction.
//!
//! Usage:
//!   decode_trace <capture.csv> <scl_name> <sda_name> [--ignore-ack]
//!
//! Example:
//!   decode_trace data_edges_only1.csv i_i2c_scl_rx_1 i_i2c_sda_rx_1

use i2c_trace_decoder::{Decoder, DecoderConfig};
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <capture.csv> <scl_name> <sda_name> [--ignore-ack]", args[0]);
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let ignore_ack = args.iter().skip(4).any(|a| a == "--ignore-ack");

    let decoder = Decoder::new(DecoderConfig::new().with_signals(&args[2], &args[3]));
    let (transactions, stats) = match decoder.decode_file_with_stats(&path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    for (idx, transaction) in transactions.iter().enumerate() {
        println!("#{}", idx);
        println!("{}", transaction.render(ignore_ack));
    }

    println!("\n=== DECODING SUMMARY ===");
    println!("Samples: {}", stats.samples);
    println!("Transactions: {}", stats.transactions);
    println!("Repeated starts: {}", stats.repeated_starts);
    println!("NACKs: {}", stats.nacks);
    if stats.dropped_open {
        println!("Capture ended inside a transaction (dropped)");
    }
}
