//! Synthetic board: a clock-driven acquisition session
//!
//! Samples accrue in a bounded ring buffer at the board's nominal rate from
//! the moment the stream starts. Polling returns the most recent window
//! without consuming it, the same way hardware drivers expose their
//! current-data view.

use bci_core::{
    BciError, BciResult, BoardConnector, BoardId, BoardSession, DeviceIdentity, SampleBuffer,
};
use crate::eeg_generator::{EegConfig, EegGenerator};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::debug;

/// Synthetic board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Signal generation
    pub eeg: EegConfig,
    /// Seconds of history kept in the ring buffer
    pub buffer_seconds: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            eeg: EegConfig::default(),
            buffer_seconds: 60.0,
        }
    }
}

/// Connector that opens synthetic sessions
#[derive(Debug, Clone, Default)]
pub struct SyntheticBoard {
    config: SyntheticConfig,
}

impl SyntheticBoard {
    pub fn new(config: SyntheticConfig) -> Self {
        SyntheticBoard { config }
    }
}

impl BoardConnector for SyntheticBoard {
    fn open(&self, identity: &DeviceIdentity) -> BciResult<Box<dyn BoardSession>> {
        if identity.board != BoardId::Synthetic {
            return Err(BciError::device(format!(
                "Synthetic connector cannot open {} board",
                identity.board
            )));
        }

        Ok(Box::new(SyntheticSession::new(self.config.clone())?))
    }
}

/// One open synthetic stream
pub struct SyntheticSession {
    generator: EegGenerator,
    ring: Vec<VecDeque<f64>>,
    capacity: usize,
    sampling_rate: f64,
    started_at: Option<Instant>,
}

impl SyntheticSession {
    pub fn new(config: SyntheticConfig) -> BciResult<Self> {
        let board = BoardId::Synthetic;
        if !config.buffer_seconds.is_finite() || config.buffer_seconds <= 0.0 {
            return Err(BciError::config("Ring buffer length must be positive"));
        }

        let sampling_rate = board.sampling_rate();
        let capacity = ((config.buffer_seconds * sampling_rate).ceil() as usize).max(1);
        let generator = EegGenerator::new(config.eeg, board)?;

        Ok(SyntheticSession {
            generator,
            ring: vec![VecDeque::with_capacity(capacity); board.row_count()],
            capacity,
            sampling_rate,
            started_at: None,
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.started_at.is_some()
    }

    /// Samples currently held in the ring buffer
    pub fn buffered(&self) -> usize {
        self.ring.first().map_or(0, VecDeque::len)
    }

    /// Poll as if the wall clock read `now`
    pub fn poll_at(&mut self, window: usize, now: Instant) -> BciResult<SampleBuffer> {
        let Some(started_at) = self.started_at else {
            return Ok(SampleBuffer::empty());
        };

        let due = (now.saturating_duration_since(started_at).as_secs_f64() * self.sampling_rate) as u64;
        let pending = due.saturating_sub(self.generator.samples_generated()) as usize;
        if pending > 0 {
            // Anything beyond the ring capacity would be evicted immediately
            let skip = pending.saturating_sub(self.capacity);
            if skip > 0 {
                self.generator.generate(skip);
            }
            let frame = self.generator.generate(pending - skip);
            self.append(&frame);
        }

        let count = window.min(self.buffered());
        let rows = self
            .ring
            .iter()
            .map(|row| row.iter().skip(row.len() - count).copied().collect())
            .collect();
        SampleBuffer::from_rows(rows)
    }

    fn append(&mut self, frame: &SampleBuffer) {
        for (ring_row, frame_row) in self.ring.iter_mut().zip(frame.rows()) {
            ring_row.extend(frame_row.iter().copied());
            let overflow = ring_row.len().saturating_sub(self.capacity);
            ring_row.drain(..overflow);
        }
    }
}

impl BoardSession for SyntheticSession {
    fn board(&self) -> BoardId {
        BoardId::Synthetic
    }

    fn start(&mut self) -> BciResult<()> {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            debug!("Synthetic stream started");
        }
        Ok(())
    }

    fn poll(&mut self, window: usize) -> BciResult<SampleBuffer> {
        self.poll_at(window, Instant::now())
    }

    fn stop(&mut self) -> BciResult<()> {
        if self.started_at.take().is_some() {
            debug!(buffered = self.buffered(), "Synthetic stream stopped");
        }
        Ok(())
    }
}
