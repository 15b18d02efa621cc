//! Bridge configuration
//!
//! Everything the host can change between cycles. The cycle driver reads a
//! snapshot by reference at the start of each cycle.

use crate::filters::KalmanConfig;
use crate::routing::ChannelSelection;
use bci_core::{BciError, BciResult, BoardId, DeviceIdentity, SinkTarget};
use serde::{Deserialize, Serialize};

/// Default serial port of the acquisition board
pub const DEFAULT_SERIAL_PORT: &str = "/dev/tty.Bluetooth-Incoming-Port";
/// Samples pulled from the device every cycle
pub const DEFAULT_WINDOW_SIZE: usize = 250;

/// Full host configuration surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// General settings
    pub general: GeneralSettings,
    /// Adaptive filter settings
    pub filter: KalmanConfig,
    /// Spectral transform settings
    pub fft: FftSettings,
    /// Outbound OSC settings
    pub osc: OscSettings,
}

/// Device and timing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Board to open
    pub board: BoardId,
    /// Serial port of the board
    pub serial_port: String,
    /// Target sample count after resampling
    pub resample: usize,
    /// Samples pulled per cycle
    pub window_size: usize,
    /// Host tick period in milliseconds; the cycle itself does not throttle
    pub update_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FftSettings {
    /// Append magnitude spectrum channels
    pub active: bool,
}

/// Outbound message settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscSettings {
    /// Destination host
    pub address: String,
    /// Destination UDP port
    pub port: u16,
    /// OSC address pattern every message is tagged with
    pub message: String,
    /// Channel selection expression, `*` or `chan<N>`/`fft_chan<N>` tokens
    pub channels: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        GeneralSettings {
            board: BoardId::Synthetic,
            serial_port: DEFAULT_SERIAL_PORT.to_string(),
            resample: 250,
            window_size: DEFAULT_WINDOW_SIZE,
            update_interval_ms: 1000,
        }
    }
}

impl Default for OscSettings {
    fn default() -> Self {
        OscSettings {
            address: "127.0.0.1".to_string(),
            port: 6448,
            message: "/wek/inputs".to_string(),
            channels: "*".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            general: GeneralSettings::default(),
            filter: KalmanConfig::default(),
            fft: FftSettings::default(),
            osc: OscSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Defaults for a given board, resampling to the board's native rate
    pub fn for_board(board: BoardId) -> Self {
        let mut config = BridgeConfig::default();
        config.general.board = board;
        config.general.resample = board.sampling_rate() as usize;
        config
    }

    /// Identity used to open the device session
    pub fn device_identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.general.board, self.general.serial_port.clone())
    }

    /// Destination of outbound messages
    pub fn sink_target(&self) -> SinkTarget {
        SinkTarget::new(self.osc.address.clone(), self.osc.port)
    }

    /// Validate entire configuration
    pub fn validate(&self) -> BciResult<()> {
        if self.general.resample == 0 {
            return Err(BciError::config("Resample target must be greater than 0"));
        }

        if self.general.window_size == 0 {
            return Err(BciError::config("Window size must be greater than 0"));
        }

        if self.general.update_interval_ms == 0 {
            return Err(BciError::config("Update interval must be greater than 0"));
        }

        self.filter.validate()?;

        if self.osc.address.trim().is_empty() {
            return Err(BciError::config("OSC address cannot be empty"));
        }

        if self.osc.port == 0 {
            return Err(BciError::config("OSC port must be non-zero"));
        }

        if !self.osc.message.starts_with('/') {
            return Err(BciError::config(format!(
                "OSC message '{}' must start with '/'",
                self.osc.message
            )));
        }

        ChannelSelection::parse(&self.osc.channels).map_err(|e| {
            BciError::config(format!("OSC channels invalid: {}", e))
        })?;

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> BciResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            BciError::config(format!("Failed to serialize configuration: {}", e))
        })
    }

    /// Import configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> BciResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            BciError::config(format!("Failed to deserialize configuration: {}", e))
        })
    }
}
