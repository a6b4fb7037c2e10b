//! Configuration loading and parsing

use anyhow::{Context, Result};
use i2c_trace_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
///
/// Every section is optional so a file can carry only the parts that differ
/// from the defaults; command-line flags are applied on top.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filtering: FilteringConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalsConfig {
    #[serde(default = "default_clock")]
    pub clock: String,
    #[serde(default = "default_data")]
    pub data: String,
}

fn default_clock() -> String {
    DecoderConfig::default().clock_signal
}

fn default_data() -> String {
    DecoderConfig::default().data_signal
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            clock: default_clock(),
            data: default_data(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub ignore_ack: bool,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringConfig {
    /// Only report transactions addressed to this 7-bit device address
    pub address: Option<u8>,
}

impl AppConfig {
    /// Decoder settings for the configured signal pair
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig::new().with_signals(&self.signals.clock, &self.signals.data)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .decoder_config()
        .validate()
        .with_context(|| format!("Invalid signal names in config file: {:?}", path))?;

    if let Some(address) = config.filtering.address {
        anyhow::ensure!(
            address <= 0x7F,
            "Filter address 0x{:x} in {:?} is not a 7-bit address",
            address,
            path
        );
    }

    Ok(config)
}

/// Parse a 7-bit device address given as `0x26` or `38`
pub fn parse_address(text: &str) -> std::result::Result<u8, String> {
    let text = text.trim();
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address {:?}: {}", text, e))?;

    if value > 0x7F {
        return Err(format!("address 0x{:x} does not fit in 7 bits", value));
    }
    Ok(value)
}
