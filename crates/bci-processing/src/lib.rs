//! BCI-Processing: per-cycle EEG processing for the OSC bridge
//!
//! Adaptive smoothing, FFT resampling, magnitude spectra, channel routing
//! and the cycle driver that ties them to a device session and a sink.

pub mod filters;
pub mod resample;
pub mod spectrum;
pub mod routing;
pub mod config;
pub mod metrics;
pub mod housekeeping;
pub mod pipeline;

pub use pipeline::*;
pub use filters::{kalman_update, KalmanConfig, KalmanFilterBank, KalmanState};
pub use resample::Resampler;
pub use spectrum::SpectrumAnalyzer;
pub use routing::{route_channels, ChannelSelection, ChannelToken};
pub use config::{BridgeConfig, FftSettings, GeneralSettings, OscSettings};
pub use metrics::{CycleMetrics, CycleTimer, Stage};
pub use housekeeping::{Housekeeper, HOUSEKEEPING_INTERVAL};
