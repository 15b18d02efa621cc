//! Adaptive scalar (Kalman) smoothing for EEG channels

use bci_core::{BciError, BciResult, SampleBuffer};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Prior estimate and covariance of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KalmanState<T = f64> {
    pub estimate: T,
    pub covariance: T,
}

impl<T: Float> KalmanState<T> {
    pub fn new(estimate: T, covariance: T) -> Self {
        Self { estimate, covariance }
    }

    /// State used whenever a prior is not a number
    pub fn reset_value() -> Self {
        Self {
            estimate: T::zero(),
            covariance: T::one(),
        }
    }
}

/// One recursive estimation step.
///
/// A NaN estimate or covariance is replaced by (0, 1) before the update.
pub fn kalman_update<T: Float>(
    observation: T,
    process_noise: T,
    measurement_noise: T,
    prior: KalmanState<T>,
) -> KalmanState<T> {
    let prior = if prior.estimate.is_nan() || prior.covariance.is_nan() {
        KalmanState::reset_value()
    } else {
        prior
    };

    let predicted_covariance = prior.covariance + process_noise;
    let gain = predicted_covariance / (predicted_covariance + measurement_noise);
    let estimate = prior.estimate + gain * (observation - prior.estimate);
    let covariance = (T::one() - gain) * predicted_covariance;

    KalmanState { estimate, covariance }
}

/// Filter tuning, as exposed on the host configuration surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// Apply the filter stage
    pub active: bool,
    /// Process noise variance (q)
    pub process_noise: f64,
    /// Measurement noise variance (r)
    pub measurement_noise: f64,
    /// Estimate each channel starts from
    pub initial_state_estimate: f64,
    /// Covariance each channel starts from
    pub initial_estimate_covariance: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            active: false,
            process_noise: 0.01,
            measurement_noise: 1.0,
            initial_state_estimate: 0.0,
            initial_estimate_covariance: 1.0,
        }
    }
}

impl KalmanConfig {
    pub fn validate(&self) -> BciResult<()> {
        if !self.process_noise.is_finite() || self.process_noise < 0.0 {
            return Err(BciError::config("Process noise must be a finite value >= 0"));
        }
        if !self.measurement_noise.is_finite() || self.measurement_noise <= 0.0 {
            return Err(BciError::config("Measurement noise must be a finite value > 0"));
        }
        if !self.initial_state_estimate.is_finite() {
            return Err(BciError::config("Initial state estimate must be finite"));
        }
        if !self.initial_estimate_covariance.is_finite() || self.initial_estimate_covariance < 0.0 {
            return Err(BciError::config("Initial estimate covariance must be a finite value >= 0"));
        }
        Ok(())
    }
}

/// Persistent per-channel filter state
#[derive(Debug, Clone)]
pub struct KalmanFilterBank {
    states: Vec<KalmanState>,
}

impl KalmanFilterBank {
    /// Allocate state for `channel_count` channels
    pub fn new(channel_count: usize, initial: KalmanState) -> Self {
        Self {
            states: vec![initial; channel_count],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, channel: usize) -> Option<&KalmanState> {
        self.states.get(channel)
    }

    /// Filter `buffer` in place, carrying each channel's state forward.
    ///
    /// Samples are visited in temporal order within a channel; the state
    /// after the last sample is what the next cycle starts from.
    pub fn apply(&mut self, buffer: &mut SampleBuffer, process_noise: f64, measurement_noise: f64) -> BciResult<()> {
        if buffer.channel_count() != self.states.len() {
            return Err(BciError::ChannelCountMismatch {
                expected: self.states.len(),
                actual: buffer.channel_count(),
            });
        }

        for (channel, state) in self.states.iter_mut().enumerate() {
            for sample in buffer.row_mut(channel) {
                *state = kalman_update(*sample, process_noise, measurement_noise, *state);
                *sample = state.estimate;
            }
        }

        Ok(())
    }
}
