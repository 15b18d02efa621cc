//! Pre-defined EEG rhythm patterns for synthetic acquisition

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Classical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EegBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl EegBand {
    /// Frequency range in Hz, lower bound inclusive
    pub fn range(&self) -> (f64, f64) {
        match self {
            EegBand::Delta => (0.5, 4.0),
            EegBand::Theta => (4.0, 8.0),
            EegBand::Alpha => (8.0, 13.0),
            EegBand::Beta => (13.0, 30.0),
            EegBand::Gamma => (30.0, 45.0),
        }
    }

    pub fn centre_frequency(&self) -> f64 {
        let (low, high) = self.range();
        (low + high) / 2.0
    }
}

/// Predefined EEG signal patterns, amplitudes in microvolts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPattern {
    /// Flat line
    Constant { level: f64 },
    /// Single sinusoid
    Sinusoidal {
        frequency: f64,
        amplitude: f64,
        baseline: f64,
    },
    /// Band-centred rhythm, slightly detuned per channel
    Rhythm { band: EegBand, amplitude: f64 },
    /// Rhythm that waxes and wanes, as alpha does with eyes closed
    Spindle {
        band: EegBand,
        amplitude: f64,
        on_duration: f64,
        off_duration: f64,
    },
    /// Mixture of all bands with 1/f amplitude falloff
    Background { amplitude: f64 },
}

impl SignalPattern {
    /// Clean signal value of `channel` at `time` seconds
    pub fn value_at(&self, time: f64, channel: usize) -> f64 {
        // Per-channel detune and phase so channels are not identical
        let detune = 1.0 + 0.03 * channel as f64;
        let phase = channel as f64 * PI / 7.0;

        match self {
            SignalPattern::Constant { level } => *level,

            SignalPattern::Sinusoidal { frequency, amplitude, baseline } => {
                baseline + amplitude * (2.0 * PI * frequency * time + phase).sin()
            },

            SignalPattern::Rhythm { band, amplitude } => {
                amplitude * (2.0 * PI * band.centre_frequency() * detune * time + phase).sin()
            },

            SignalPattern::Spindle { band, amplitude, on_duration, off_duration } => {
                let cycle = on_duration + off_duration;
                if cycle <= 0.0 {
                    return 0.0;
                }
                let t = time % cycle;
                if t >= *on_duration {
                    return 0.0;
                }
                // Hann envelope over the active part
                let envelope = 0.5 - 0.5 * (2.0 * PI * t / on_duration).cos();
                envelope * amplitude * (2.0 * PI * band.centre_frequency() * detune * time + phase).sin()
            },

            SignalPattern::Background { amplitude } => {
                [EegBand::Delta, EegBand::Theta, EegBand::Alpha, EegBand::Beta, EegBand::Gamma]
                    .iter()
                    .map(|band| {
                        let f = band.centre_frequency() * detune;
                        (amplitude / f) * (2.0 * PI * f * time + phase).sin()
                    })
                    .sum()
            },
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("Flat", SignalPattern::Constant { level: 0.0 }),
            ("Eyes Closed", SignalPattern::Spindle {
                band: EegBand::Alpha, amplitude: 40.0, on_duration: 2.0, off_duration: 0.5
            }),
            ("Eyes Open", SignalPattern::Rhythm { band: EegBand::Beta, amplitude: 10.0 }),
            ("Drowsy", SignalPattern::Rhythm { band: EegBand::Theta, amplitude: 30.0 }),
            ("Deep Sleep", SignalPattern::Rhythm { band: EegBand::Delta, amplitude: 80.0 }),
            ("Focused", SignalPattern::Rhythm { band: EegBand::Gamma, amplitude: 5.0 }),
            ("Background", SignalPattern::Background { amplitude: 100.0 }),
        ]
    }

    /// Look up a preset by name, ignoring case
    pub fn preset(name: &str) -> Option<SignalPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, pattern)| pattern)
    }
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Background { amplitude: 100.0 }
    }
}
