//! SampleBuffer: one acquisition window of multichannel readings

use crate::error::{BciError, BciResult};

/// Channel-major 2D array of readings.
///
/// Row `r` holds every sample of channel `r`, contiguous in memory, so
/// per-channel stages (filtering, FFTs) work on plain slices.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: usize,
    samples: usize,
    data: Vec<f64>,
}

impl SampleBuffer {
    /// Create a buffer from flat channel-major data
    pub fn new(channels: usize, samples: usize, data: Vec<f64>) -> BciResult<Self> {
        if data.len() != channels * samples {
            return Err(BciError::InvalidSignalData {
                reason: format!(
                    "Data length {} doesn't match {} channels x {} samples",
                    data.len(),
                    channels,
                    samples
                ),
            });
        }

        Ok(SampleBuffer { channels, samples, data })
    }

    /// Zero-filled buffer
    pub fn zeros(channels: usize, samples: usize) -> Self {
        SampleBuffer {
            channels,
            samples,
            data: vec![0.0; channels * samples],
        }
    }

    /// Buffer with no channels and no samples
    pub fn empty() -> Self {
        Self::zeros(0, 0)
    }

    /// Build a buffer from one vector per channel; all rows must be equally long
    pub fn from_rows(rows: Vec<Vec<f64>>) -> BciResult<Self> {
        let channels = rows.len();
        let samples = rows.first().map_or(0, Vec::len);

        let mut data = Vec::with_capacity(channels * samples);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != samples {
                return Err(BciError::InvalidSignalData {
                    reason: format!(
                        "Row {} has {} samples, expected {}",
                        idx,
                        row.len(),
                        samples
                    ),
                });
            }
            data.extend(row);
        }

        Ok(SampleBuffer { channels, samples, data })
    }

    /// Number of channels (rows)
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Number of samples per channel (columns)
    pub fn samples_per_channel(&self) -> usize {
        self.samples
    }

    /// (channels, samples)
    pub fn shape(&self) -> (usize, usize) {
        (self.channels, self.samples)
    }

    /// True when there is nothing to process
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Samples of one channel
    pub fn row(&self, channel: usize) -> &[f64] {
        let start = channel * self.samples;
        &self.data[start..start + self.samples]
    }

    /// Mutable samples of one channel
    pub fn row_mut(&mut self, channel: usize) -> &mut [f64] {
        let start = channel * self.samples;
        &mut self.data[start..start + self.samples]
    }

    /// Iterate over channel rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.samples.max(1)).take(self.channels)
    }

    /// Single reading, `None` when out of range
    pub fn get(&self, channel: usize, sample: usize) -> Option<f64> {
        if channel < self.channels && sample < self.samples {
            Some(self.data[channel * self.samples + sample])
        } else {
            None
        }
    }

    /// Flat channel-major view of the data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy out the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> BciResult<SampleBuffer> {
        let mut data = Vec::with_capacity(rows.len() * self.samples);

        for &row in rows {
            if row >= self.channels {
                return Err(BciError::InvalidSignalData {
                    reason: format!(
                        "Row index {} out of bounds ({} rows)",
                        row, self.channels
                    ),
                });
            }
            data.extend_from_slice(self.row(row));
        }

        Ok(SampleBuffer {
            channels: rows.len(),
            samples: self.samples,
            data,
        })
    }

    /// Keep only the most recent `count` samples of every row
    pub fn tail(&self, count: usize) -> SampleBuffer {
        let keep = count.min(self.samples);
        let skip = self.samples - keep;

        let mut data = Vec::with_capacity(self.channels * keep);
        for row in self.rows() {
            data.extend_from_slice(&row[skip..]);
        }

        SampleBuffer {
            channels: self.channels,
            samples: keep,
            data,
        }
    }
}
