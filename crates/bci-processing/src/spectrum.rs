//! Magnitude spectrum of resampled channels

use bci_core::{BciResult, SampleBuffer};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Full-length DFT magnitude per channel.
///
/// Output has the same shape as the input; bins above the Nyquist index
/// mirror the ones below it.
pub struct SpectrumAnalyzer {
    fft_planner: FftPlanner<f64>,
    fft_buffer: Vec<Complex<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        SpectrumAnalyzer {
            fft_planner: FftPlanner::new(),
            fft_buffer: Vec::new(),
        }
    }

    pub fn magnitude(&mut self, input: &SampleBuffer) -> BciResult<SampleBuffer> {
        let (channels, samples) = input.shape();
        let mut output = SampleBuffer::zeros(channels, samples);
        if samples == 0 {
            return Ok(output);
        }

        let fft = self.fft_planner.plan_fft_forward(samples);

        for channel in 0..channels {
            self.fft_buffer.clear();
            self.fft_buffer
                .extend(input.row(channel).iter().map(|&x| Complex::new(x, 0.0)));

            fft.process(&mut self.fft_buffer);

            for (out, bin) in output.row_mut(channel).iter_mut().zip(&self.fft_buffer) {
                *out = bin.norm();
            }
        }

        Ok(output)
    }

    /// Drop cached FFT plans and scratch memory
    pub fn release_caches(&mut self) {
        self.fft_planner = FftPlanner::new();
        self.fft_buffer = Vec::new();
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
