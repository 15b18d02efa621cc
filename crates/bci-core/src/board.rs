//! Acquisition board identities and channel layout metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::{BciError, BciResult};

/// Supported acquisition boards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardId {
    /// Software board producing synthetic EEG
    #[default]
    Synthetic,
    /// OpenBCI Cyton, 8 EEG channels
    Cyton,
    /// OpenBCI Ganglion, 4 EEG channels
    Ganglion,
    /// BrainBit headband, 4 EEG channels
    BrainBit,
}

/// Row layout of one board's data frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardDescriptor {
    /// Display name
    pub name: &'static str,
    /// Nominal sampling rate in Hz
    pub sampling_rate: f64,
    /// Total rows in a polled frame
    pub row_count: usize,
    /// Row holding the package counter
    pub package_row: usize,
    /// First EEG row (inclusive)
    pub eeg_first_row: usize,
    /// Number of EEG rows, contiguous from `eeg_first_row`
    pub eeg_row_count: usize,
    /// Row holding the unix timestamp in seconds
    pub timestamp_row: usize,
}

const SYNTHETIC: BoardDescriptor = BoardDescriptor {
    name: "Synthetic",
    sampling_rate: 250.0,
    row_count: 32,
    package_row: 0,
    eeg_first_row: 1,
    eeg_row_count: 16,
    timestamp_row: 30,
};

const CYTON: BoardDescriptor = BoardDescriptor {
    name: "Cyton",
    sampling_rate: 250.0,
    row_count: 24,
    package_row: 0,
    eeg_first_row: 1,
    eeg_row_count: 8,
    timestamp_row: 22,
};

const GANGLION: BoardDescriptor = BoardDescriptor {
    name: "Ganglion",
    sampling_rate: 200.0,
    row_count: 15,
    package_row: 0,
    eeg_first_row: 1,
    eeg_row_count: 4,
    timestamp_row: 13,
};

const BRAINBIT: BoardDescriptor = BoardDescriptor {
    name: "BrainBit",
    sampling_rate: 250.0,
    row_count: 10,
    package_row: 0,
    eeg_first_row: 1,
    eeg_row_count: 4,
    timestamp_row: 8,
};

impl BoardId {
    /// Every known board, in menu order
    pub const ALL: [BoardId; 4] = [
        BoardId::Synthetic,
        BoardId::Cyton,
        BoardId::Ganglion,
        BoardId::BrainBit,
    ];

    /// Row layout for this board
    pub fn descriptor(&self) -> &'static BoardDescriptor {
        match self {
            BoardId::Synthetic => &SYNTHETIC,
            BoardId::Cyton => &CYTON,
            BoardId::Ganglion => &GANGLION,
            BoardId::BrainBit => &BRAINBIT,
        }
    }

    /// Row indices of the EEG channels within a polled frame
    pub fn eeg_channels(&self) -> Vec<usize> {
        let desc = self.descriptor();
        (desc.eeg_first_row..desc.eeg_first_row + desc.eeg_row_count).collect()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.descriptor().sampling_rate
    }

    pub fn row_count(&self) -> usize {
        self.descriptor().row_count
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardId {
    type Err = BciError;

    fn from_str(s: &str) -> BciResult<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        BoardId::ALL
            .iter()
            .copied()
            .find(|board| board.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| BciError::config(format!(
                "Unknown board '{}', expected one of: synthetic, cyton, ganglion, brainbit",
                s
            )))
    }
}

/// Everything needed to open a device session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub board: BoardId,
    /// Serial port or other transport address; ignored by the synthetic board
    pub serial_port: String,
}

impl DeviceIdentity {
    pub fn new(board: BoardId, serial_port: impl Into<String>) -> Self {
        Self {
            board,
            serial_port: serial_port.into(),
        }
    }
}
