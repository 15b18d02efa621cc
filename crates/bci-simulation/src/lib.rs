//! BCI-Simulation: synthetic EEG acquisition
//!
//! A stand-in board that streams realistic EEG rhythms through the same
//! session interface a hardware driver implements.

pub mod signal_patterns;
pub mod eeg_generator;
pub mod synthetic_board;

pub use signal_patterns::*;
pub use eeg_generator::*;
pub use synthetic_board::*;
