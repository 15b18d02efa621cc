//! EEG frame generator with realistic noise and interference

use bci_core::{BciError, BciResult, BoardDescriptor, BoardId, SampleBuffer};
use crate::signal_patterns::SignalPattern;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

/// Package counters wrap like the 8-bit counter of OpenBCI boards
const PACKAGE_COUNTER_MODULUS: u64 = 256;

/// Noise configuration, amplitudes in microvolts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Slow electrode drift amplitude
    pub baseline_wander: f64,
    /// Per-sample probability of a blink or movement artifact
    pub artifact_prob: f64,
    /// Artifact amplitude
    pub artifact_amp: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 2.0,
            baseline_wander: 5.0,
            artifact_prob: 0.001,
            artifact_amp: 60.0,
        }
    }
}

impl NoiseConfig {
    /// No noise at all
    pub fn silent() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            artifact_prob: 0.0,
            artifact_amp: 0.0,
        }
    }
}

/// Configuration for synthetic EEG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EegConfig {
    /// Signal pattern on every EEG row
    pub pattern: SignalPattern,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq: Option<f64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            pattern: SignalPattern::default(),
            noise: NoiseConfig::default(),
            powerline_freq: Some(50.0),
            seed: None,
        }
    }
}

/// Produces consecutive full-layout frames for one board
pub struct EegGenerator {
    config: EegConfig,
    layout: &'static BoardDescriptor,
    rng: StdRng,
    normal_dist: Normal<f64>,
    samples_generated: u64,
    epoch_start: f64,
}

impl EegGenerator {
    /// Create a generator emitting frames in `board`'s row layout
    pub fn new(config: EegConfig, board: BoardId) -> BciResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| {
            BciError::config(format!("Failed to create normal distribution: {}", e))
        })?;

        if !(0.0..=1.0).contains(&config.noise.artifact_prob) {
            return Err(BciError::config("Artifact probability must be within [0, 1]"));
        }

        let epoch_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Ok(EegGenerator {
            config,
            layout: board.descriptor(),
            rng,
            normal_dist,
            samples_generated: 0,
            epoch_start,
        })
    }

    /// Generate the next `samples` samples of every row
    pub fn generate(&mut self, samples: usize) -> SampleBuffer {
        let layout = self.layout;
        let dt = 1.0 / layout.sampling_rate;
        let mut frame = SampleBuffer::zeros(layout.row_count, samples);

        for sample_idx in 0..samples {
            let index = self.samples_generated + sample_idx as u64;
            let time = index as f64 * dt;

            frame.row_mut(layout.package_row)[sample_idx] = (index % PACKAGE_COUNTER_MODULUS) as f64;
            frame.row_mut(layout.timestamp_row)[sample_idx] = self.epoch_start + time;

            for channel in 0..layout.eeg_row_count {
                let mut value = self.config.pattern.value_at(time, channel);
                value += self.noise(time);

                if let Some(freq) = self.config.powerline_freq {
                    value += 1.5 * (2.0 * PI * freq * time).sin();
                }

                frame.row_mut(layout.eeg_first_row + channel)[sample_idx] = value;
            }
        }

        self.samples_generated += samples as u64;
        frame
    }

    fn noise(&mut self, time: f64) -> f64 {
        let noise_config = &self.config.noise;
        let mut noise = 0.0;

        if noise_config.gaussian_std > 0.0 {
            noise += self.normal_dist.sample(&mut self.rng);
        }

        // Electrode drift
        noise += noise_config.baseline_wander * (2.0 * PI * 0.1 * time).sin();

        if noise_config.artifact_prob > 0.0 && self.rng.gen::<f64>() < noise_config.artifact_prob {
            noise += noise_config.artifact_amp * self.rng.gen_range(-1.0..1.0);
        }

        noise
    }

    /// Total samples produced so far
    pub fn samples_generated(&self) -> u64 {
        self.samples_generated
    }
}
