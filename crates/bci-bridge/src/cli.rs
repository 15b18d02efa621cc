//! Command line surface

use anyhow::{Context, Result};
use bci_core::BoardId;
use bci_processing::BridgeConfig;
use bci_simulation::{SignalPattern, SyntheticConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bci-bridge")]
#[command(about = "Stream EEG from an acquisition board to an OSC receiver", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Board to open (synthetic, cyton, ganglion, brainbit)
    #[arg(long)]
    pub board: Option<BoardId>,

    /// Serial port of the board
    #[arg(long)]
    pub serial_port: Option<String>,

    /// Samples per channel after resampling
    #[arg(long)]
    pub resample: Option<usize>,

    /// Samples polled from the board per cycle
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Cycle period in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Enable adaptive filtering
    #[arg(long)]
    pub filter: bool,

    /// Filter process noise (q)
    #[arg(long)]
    pub process_noise: Option<f64>,

    /// Filter measurement noise (r)
    #[arg(long)]
    pub measurement_noise: Option<f64>,

    /// Append magnitude spectrum channels
    #[arg(long)]
    pub fft: bool,

    /// OSC destination host
    #[arg(long)]
    pub osc_address: Option<String>,

    /// OSC destination port
    #[arg(long)]
    pub osc_port: Option<u16>,

    /// OSC address pattern of every message
    #[arg(long)]
    pub osc_message: Option<String>,

    /// Channel selection, `*` or e.g. "chan1 chan2 fft_chan1"
    #[arg(long)]
    pub channels: Option<String>,

    /// Synthetic board signal preset
    #[arg(long)]
    pub pattern: Option<String>,

    /// Seed for the synthetic board noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Load the configuration file, if any, then apply flag overrides
    pub fn load_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                BridgeConfig::from_json(&text)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => BridgeConfig::default(),
        };

        self.apply_overrides(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut BridgeConfig) {
        let general = &mut config.general;
        if let Some(board) = self.board {
            general.board = board;
        }
        if let Some(port) = &self.serial_port {
            general.serial_port = port.clone();
        }
        if let Some(resample) = self.resample {
            general.resample = resample;
        }
        if let Some(window) = self.window_size {
            general.window_size = window;
        }
        if let Some(interval) = self.interval_ms {
            general.update_interval_ms = interval;
        }

        let filter = &mut config.filter;
        if self.filter {
            filter.active = true;
        }
        if let Some(q) = self.process_noise {
            filter.process_noise = q;
        }
        if let Some(r) = self.measurement_noise {
            filter.measurement_noise = r;
        }

        if self.fft {
            config.fft.active = true;
        }

        let osc = &mut config.osc;
        if let Some(address) = &self.osc_address {
            osc.address = address.clone();
        }
        if let Some(port) = self.osc_port {
            osc.port = port;
        }
        if let Some(message) = &self.osc_message {
            osc.message = message.clone();
        }
        if let Some(channels) = &self.channels {
            osc.channels = channels.clone();
        }
    }

    /// Settings for the synthetic board driver
    pub fn synthetic_config(&self) -> Result<SyntheticConfig> {
        let mut config = SyntheticConfig::default();
        if let Some(name) = &self.pattern {
            config.eeg.pattern = SignalPattern::preset(name).with_context(|| {
                let known: Vec<_> = SignalPattern::presets().into_iter().map(|(n, _)| n).collect();
                format!("Unknown pattern '{}', expected one of: {}", name, known.join(", "))
            })?;
        }
        config.eeg.seed = self.seed;
        Ok(config)
    }
}
