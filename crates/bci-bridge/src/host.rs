//! Cook loop driving the bridge on a fixed tick
//!
//! Cycles run inline in the loop, so two cycles never overlap. Late ticks
//! are skipped rather than bunched up.

use bci_core::BciResult;
use bci_processing::{BridgeConfig, BridgeContext, CycleOutcome, SkipReason};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Tally of cycle outcomes over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSummary {
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Completed cycles that took longer than one tick
    pub overruns: u64,
    pub messages_sent: u64,
}

impl HostSummary {
    pub fn cycles(&self) -> u64 {
        self.completed + self.skipped + self.failed
    }

    /// Log and count the result of one cycle
    fn record(&mut self, result: BciResult<CycleOutcome>, budget: Duration) {
        match result {
            Ok(CycleOutcome::Completed(report)) => {
                self.completed += 1;
                self.messages_sent += report.messages_sent as u64;
                if report.housekeeping {
                    debug!(cycle = report.cycle, "Housekeeping pass ran");
                }
                if !report.metrics.within_budget(budget) {
                    self.overruns += 1;
                    warn!(
                        cycle = report.cycle,
                        total_us = report.metrics.total_us,
                        budget_ms = budget.as_millis() as u64,
                        "Cycle exceeded update interval"
                    );
                }
            }
            Ok(CycleOutcome::Skipped(SkipReason::NoData)) => {
                self.skipped += 1;
                info!("No EEG data received");
            }
            Err(e) if e.is_connection_error() => {
                self.failed += 1;
                warn!("{}", e);
            }
            Err(e) => {
                self.failed += 1;
                error!("Error processing EEG data: {}", e);
            }
        }
    }
}

/// Run cycles until `shutdown` resolves or `max_cycles` have run
pub async fn run<F>(
    context: &mut BridgeContext,
    config: &BridgeConfig,
    max_cycles: Option<u64>,
    shutdown: F,
) -> HostSummary
where
    F: Future<Output = ()>,
{
    let period = Duration::from_millis(config.general.update_interval_ms);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(
        interval_ms = config.general.update_interval_ms,
        "Bridge running, {} -> {}",
        config.general.board,
        config.sink_target()
    );

    let mut summary = HostSummary::default();
    loop {
        if max_cycles.is_some_and(|max| summary.cycles() >= max) {
            break;
        }

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                summary.record(context.run_cycle(config), period);
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::DeviceRegistry;
    use bci_core::{BoardId, MessageSink, SinkConnector, SinkTarget};
    use bci_simulation::{NoiseConfig, SyntheticConfig};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingConnector {
        messages: Arc<Mutex<Vec<usize>>>,
    }

    struct CountingSink {
        target: SinkTarget,
        messages: Arc<Mutex<Vec<usize>>>,
    }

    impl SinkConnector for CountingConnector {
        fn connect(&self, target: &SinkTarget) -> BciResult<Box<dyn MessageSink>> {
            Ok(Box::new(CountingSink {
                target: target.clone(),
                messages: Arc::clone(&self.messages),
            }))
        }
    }

    impl MessageSink for CountingSink {
        fn send(&mut self, _tag: &str, values: &[f64]) -> BciResult<()> {
            self.messages.lock().unwrap().push(values.len());
            Ok(())
        }

        fn target(&self) -> &SinkTarget {
            &self.target
        }
    }

    fn context(sink: CountingConnector) -> BridgeContext {
        let mut synthetic = SyntheticConfig::default();
        synthetic.eeg.noise = NoiseConfig::silent();
        BridgeContext::new(Box::new(DeviceRegistry::new(synthetic)), Box::new(sink))
    }

    fn fast_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.general.update_interval_ms = 40;
        config
    }

    #[tokio::test]
    async fn test_streams_synthetic_board() {
        let sink = CountingConnector::default();
        let mut context = context(sink.clone());
        let config = fast_config();

        let summary = run(&mut context, &config, Some(5), std::future::pending()).await;
        context.shutdown().unwrap();

        assert_eq!(summary.cycles(), 5);
        assert_eq!(summary.failed, 0);
        assert!(summary.completed >= 1);

        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len() as u64, summary.messages_sent);
        assert_eq!(summary.messages_sent, summary.completed * 250);
        // Synthetic board carries 16 EEG channels
        assert!(messages.iter().all(|&len| len == 16));
    }

    #[tokio::test]
    async fn test_missing_driver_fails_every_cycle() {
        let sink = CountingConnector::default();
        let mut context = context(sink.clone());
        let mut config = fast_config();
        config.general.board = BoardId::Cyton;

        let summary = run(&mut context, &config, Some(3), std::future::pending()).await;

        assert_eq!(summary.failed, 3);
        assert!(!context.is_device_connected());
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let mut context = context(CountingConnector::default());
        let config = fast_config();

        let summary = run(&mut context, &config, None, std::future::ready(())).await;
        assert_eq!(summary.cycles(), 0);
    }
}
