//! Fourier resampling to a fixed sample count

use bci_core::{BciError, BciResult, SampleBuffer};
use num_complex::Complex;
use realfft::RealFftPlanner;

/// Band-limited resampler working along the sample axis.
///
/// Each channel is taken to the frequency domain with a real FFT of the
/// input length, the spectrum is truncated or zero-padded to the target
/// length and transformed back. Plans are cached by the planner until
/// [`Resampler::release_caches`] is called.
pub struct Resampler {
    planner: RealFftPlanner<f64>,
    scratch: Vec<f64>,
}

impl Resampler {
    pub fn new() -> Self {
        Resampler {
            planner: RealFftPlanner::new(),
            scratch: Vec::new(),
        }
    }

    /// Resample every channel of `input` to `target` samples
    pub fn resample(&mut self, input: &SampleBuffer, target: usize) -> BciResult<SampleBuffer> {
        let (channels, source) = input.shape();

        if target == 0 {
            return Err(BciError::processing("Resample target must be at least one sample"));
        }
        if source == 0 {
            return Err(BciError::InvalidSignalData {
                reason: "Cannot resample a buffer with no samples".to_string(),
            });
        }

        let forward = self.planner.plan_fft_forward(source);
        let inverse = self.planner.plan_fft_inverse(target);

        let mut spectrum = forward.make_output_vec();
        let mut resampled_spectrum = inverse.make_input_vec();
        let mut output = SampleBuffer::zeros(channels, target);

        let kept = source.min(target);
        let copied_bins = kept / 2 + 1;
        let scale = 1.0 / source as f64;

        for channel in 0..channels {
            self.scratch.clear();
            self.scratch.extend_from_slice(input.row(channel));

            forward.process(&mut self.scratch, &mut spectrum).map_err(|e| {
                BciError::processing(format!("Forward FFT failed on channel {}: {}", channel, e))
            })?;

            resampled_spectrum.fill(Complex::new(0.0, 0.0));
            resampled_spectrum[..copied_bins].copy_from_slice(&spectrum[..copied_bins]);

            // The bin at kept/2 is shared between positive and negative frequencies
            if kept % 2 == 0 {
                if target < source {
                    resampled_spectrum[kept / 2] *= 2.0;
                } else if source < target {
                    resampled_spectrum[kept / 2] *= 0.5;
                }
            }

            // DC and the even-length Nyquist bin must be real for the inverse
            resampled_spectrum[0].im = 0.0;
            if target % 2 == 0 {
                resampled_spectrum[target / 2].im = 0.0;
            }

            let row = output.row_mut(channel);
            inverse.process(&mut resampled_spectrum, row).map_err(|e| {
                BciError::processing(format!("Inverse FFT failed on channel {}: {}", channel, e))
            })?;

            for value in row.iter_mut() {
                *value *= scale;
            }
        }

        Ok(output)
    }

    /// Drop cached FFT plans and scratch memory
    pub fn release_caches(&mut self) {
        self.planner = RealFftPlanner::new();
        self.scratch = Vec::new();
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}
