//! Per-cycle stage timing

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Pipeline stages that are timed individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Acquire,
    Filter,
    Resample,
    Spectrum,
    Publish,
    Emit,
    Housekeeping,
}

/// Timing of one completed cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleMetrics {
    /// Wall time of the whole cycle in microseconds
    pub total_us: u64,
    /// Wall time per stage, in execution order
    pub stages: Vec<(Stage, u64)>,
}

impl CycleMetrics {
    /// Time spent in one stage, if it ran
    pub fn stage_us(&self, stage: Stage) -> Option<u64> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|&(_, us)| us)
    }

    /// Whether the cycle fit in the host tick period
    pub fn within_budget(&self, budget: Duration) -> bool {
        u128::from(self.total_us) <= budget.as_micros()
    }
}

/// Helper for timing a cycle stage by stage
pub struct CycleTimer {
    cycle_start: Instant,
    stage_start: Instant,
    metrics: CycleMetrics,
}

impl CycleTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        CycleTimer {
            cycle_start: now,
            stage_start: now,
            metrics: CycleMetrics::default(),
        }
    }

    /// Record the time since the previous mark as `stage`
    pub fn mark(&mut self, stage: Stage) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.stage_start).as_micros() as u64;
        self.metrics.stages.push((stage, elapsed));
        self.stage_start = now;
    }

    /// Finish timing and return metrics
    pub fn finish(mut self) -> CycleMetrics {
        self.metrics.total_us = self.cycle_start.elapsed().as_micros() as u64;
        self.metrics
    }
}
