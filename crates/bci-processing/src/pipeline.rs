//! Per-cycle acquisition and processing pipeline
//!
//! [`BridgeContext`] owns every piece of state that must outlive a single
//! cycle: the device session, the outbound sink, the filter state, the FFT
//! caches and the housekeeping clock. The host calls
//! [`BridgeContext::run_cycle`] once per tick and never concurrently.

use crate::config::BridgeConfig;
use crate::filters::{KalmanFilterBank, KalmanState};
use crate::housekeeping::Housekeeper;
use crate::metrics::{CycleMetrics, CycleTimer, Stage};
use crate::resample::Resampler;
use crate::routing::route_channels;
use crate::spectrum::SpectrumAnalyzer;
use bci_core::{
    BciError, BciResult, BoardConnector, BoardSession, MessageSink, SampleBuffer, SinkConnector,
};
use std::time::Instant;
use tracing::{debug, info};

/// One named output channel
#[derive(Debug, Clone, PartialEq)]
pub struct OutputChannel {
    pub name: String,
    pub samples: Vec<f64>,
}

/// Named outputs of the last completed write step.
///
/// Raw channels come first as `chan1..chanC`, followed by `fft_chan1..fft_chanC`
/// when the spectral stage ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputChannels {
    channels: Vec<OutputChannel>,
    num_samples: usize,
}

impl OutputChannels {
    /// Build a fresh set from this cycle's buffers
    pub fn build(resampled: &SampleBuffer, spectral: Option<&SampleBuffer>) -> Self {
        let mut channels = Vec::with_capacity(
            resampled.channel_count() * if spectral.is_some() { 2 } else { 1 },
        );

        for (idx, row) in resampled.rows().enumerate() {
            channels.push(OutputChannel {
                name: format!("chan{}", idx + 1),
                samples: row.to_vec(),
            });
        }

        if let Some(spectral) = spectral {
            for (idx, row) in spectral.rows().enumerate() {
                channels.push(OutputChannel {
                    name: format!("fft_chan{}", idx + 1),
                    samples: row.to_vec(),
                });
            }
        }

        OutputChannels {
            channels,
            num_samples: resampled.samples_per_channel(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn get(&self, name: &str) -> Option<&OutputChannel> {
        self.channels.iter().find(|channel| channel.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputChannel> {
        self.channels.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|channel| channel.name.as_str()).collect()
    }
}

/// Why a cycle ended early without doing any work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The device had no samples buffered yet
    NoData,
}

/// Summary of a completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Sequence number of this cycle, counting completed cycles from 1
    pub cycle: u64,
    /// Raw EEG channels processed
    pub raw_channels: usize,
    /// Samples per channel delivered by the device
    pub samples_acquired: usize,
    /// Samples per channel after resampling
    pub output_samples: usize,
    /// Logical channels routed to the sink, in message order
    pub routed_channels: Vec<usize>,
    /// Messages handed to the sink
    pub messages_sent: usize,
    pub filtered: bool,
    pub spectral: bool,
    /// Whether the maintenance pass ran at the end of this cycle
    pub housekeeping: bool,
    pub metrics: CycleMetrics,
}

/// Result of a cycle that did not fail
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped(SkipReason),
}

/// Long-lived state of the bridge
pub struct BridgeContext {
    connector: Box<dyn BoardConnector>,
    sink_connector: Box<dyn SinkConnector>,
    session: Option<Box<dyn BoardSession>>,
    sink: Option<Box<dyn MessageSink>>,
    filter_bank: Option<KalmanFilterBank>,
    resampler: Resampler,
    spectrum: SpectrumAnalyzer,
    housekeeper: Housekeeper,
    outputs: OutputChannels,
    message: Vec<f64>,
    cycles_completed: u64,
}

impl BridgeContext {
    pub fn new(connector: Box<dyn BoardConnector>, sink_connector: Box<dyn SinkConnector>) -> Self {
        Self::with_housekeeper(connector, sink_connector, Housekeeper::default())
    }

    /// Context with an explicit housekeeping clock
    pub fn with_housekeeper(
        connector: Box<dyn BoardConnector>,
        sink_connector: Box<dyn SinkConnector>,
        housekeeper: Housekeeper,
    ) -> Self {
        BridgeContext {
            connector,
            sink_connector,
            session: None,
            sink: None,
            filter_bank: None,
            resampler: Resampler::new(),
            spectrum: SpectrumAnalyzer::new(),
            housekeeper,
            outputs: OutputChannels::default(),
            message: Vec::new(),
            cycles_completed: 0,
        }
    }

    /// Run one acquire-process-emit cycle
    pub fn run_cycle(&mut self, config: &BridgeConfig) -> BciResult<CycleOutcome> {
        self.run_cycle_at(config, Instant::now())
    }

    /// Run one cycle, using `now` for the housekeeping clock
    pub fn run_cycle_at(&mut self, config: &BridgeConfig, now: Instant) -> BciResult<CycleOutcome> {
        self.ensure_session(config)?;
        self.ensure_sink(config)?;

        let mut timer = CycleTimer::start();

        let (session, sink) = match (self.session.as_deref_mut(), self.sink.as_deref_mut()) {
            (Some(session), Some(sink)) => (session, sink),
            _ => return Err(BciError::processing("Device session or sink missing after initialisation")),
        };

        let board = session.board();
        let frame = session.poll(config.general.window_size)?;
        if frame.is_empty() {
            return Ok(CycleOutcome::Skipped(SkipReason::NoData));
        }

        let mut eeg = frame.select_rows(&board.eeg_channels())?;
        if eeg.is_empty() {
            return Ok(CycleOutcome::Skipped(SkipReason::NoData));
        }
        let (raw_channels, samples_acquired) = eeg.shape();
        timer.mark(Stage::Acquire);

        let filtered = config.filter.active;
        if filtered {
            let params = &config.filter;
            let bank = self.filter_bank.get_or_insert_with(|| {
                debug!("Allocating filter state for {} channels", raw_channels);
                KalmanFilterBank::new(
                    raw_channels,
                    KalmanState::new(params.initial_state_estimate, params.initial_estimate_covariance),
                )
            });
            bank.apply(&mut eeg, params.process_noise, params.measurement_noise)?;
            timer.mark(Stage::Filter);
        }

        let resampled = self.resampler.resample(&eeg, config.general.resample)?;
        timer.mark(Stage::Resample);

        let spectral = if config.fft.active {
            let magnitudes = self.spectrum.magnitude(&resampled)?;
            timer.mark(Stage::Spectrum);
            Some(magnitudes)
        } else {
            None
        };

        self.outputs = OutputChannels::build(&resampled, spectral.as_ref());
        timer.mark(Stage::Publish);

        let routed = route_channels(&config.osc.channels, raw_channels, spectral.is_some())?;
        let output_samples = resampled.samples_per_channel();
        let message_count = spectral
            .as_ref()
            .map_or(output_samples, |s| output_samples.min(s.samples_per_channel()));

        let mut messages_sent = 0;
        if !routed.is_empty() {
            for sample in 0..message_count {
                self.message.clear();
                for &channel in &routed {
                    let value = if channel < raw_channels {
                        resampled.get(channel, sample)
                    } else {
                        // Spectral tokens resolve even with the transform off; skip them then
                        spectral
                            .as_ref()
                            .and_then(|s| s.get(channel - raw_channels, sample))
                    };
                    if let Some(value) = value {
                        self.message.push(value);
                    }
                }
                sink.send(&config.osc.message, &self.message)?;
                messages_sent += 1;
            }
        }
        timer.mark(Stage::Emit);

        let housekeeping = self.housekeeper.due(now);
        if housekeeping {
            info!("Performing cleanup...");
            self.reclaim_memory();
            timer.mark(Stage::Housekeeping);
        }

        self.cycles_completed += 1;
        let report = CycleReport {
            cycle: self.cycles_completed,
            raw_channels,
            samples_acquired,
            output_samples,
            routed_channels: routed,
            messages_sent,
            filtered,
            spectral: spectral.is_some(),
            housekeeping,
            metrics: timer.finish(),
        };

        debug!(
            cycle = report.cycle,
            channels = report.raw_channels,
            acquired = report.samples_acquired,
            messages = report.messages_sent,
            total_us = report.metrics.total_us,
            "Cycle complete"
        );

        Ok(CycleOutcome::Completed(report))
    }

    /// Open and start the device session unless one is already running
    fn ensure_session(&mut self, config: &BridgeConfig) -> BciResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let identity = config.device_identity();
        let mut session = self.connector.open(&identity)?;
        session.start()?;

        info!(
            board = %identity.board,
            "Data streaming started on {}. Collecting data...",
            identity.serial_port
        );
        self.session = Some(session);
        Ok(())
    }

    /// Create the outbound sink unless one already exists
    fn ensure_sink(&mut self, config: &BridgeConfig) -> BciResult<()> {
        if self.sink.is_some() {
            return Ok(());
        }

        let target = config.sink_target();
        let sink = self.sink_connector.connect(&target)?;
        info!("OSC client started at {}", target);
        self.sink = Some(sink);
        Ok(())
    }

    /// Release cached FFT plans and scratch buffers
    fn reclaim_memory(&mut self) {
        self.resampler.release_caches();
        self.spectrum.release_caches();
        self.message.shrink_to_fit();
    }

    /// Outputs of the most recent completed write step
    pub fn outputs(&self) -> &OutputChannels {
        &self.outputs
    }

    pub fn filter_bank(&self) -> Option<&KalmanFilterBank> {
        self.filter_bank.as_ref()
    }

    pub fn is_device_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Stop the device stream and drop both connections
    pub fn shutdown(&mut self) -> BciResult<()> {
        self.sink = None;
        if let Some(mut session) = self.session.take() {
            session.stop()?;
            info!(board = %session.board(), "Device session closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::housekeeping::HOUSEKEEPING_INTERVAL;
    use bci_core::{BoardId, DeviceIdentity, SinkTarget};
    use std::collections::VecDeque;
    use std::f64::consts::PI;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Sent = Arc<Mutex<Vec<(String, Vec<f64>)>>>;

    #[derive(Default)]
    struct Script {
        open_failures: usize,
        opens: usize,
        frames: VecDeque<SampleBuffer>,
        stopped: bool,
    }

    struct ScriptedConnector {
        script: Arc<Mutex<Script>>,
    }

    struct ScriptedSession {
        board: BoardId,
        script: Arc<Mutex<Script>>,
    }

    impl BoardConnector for ScriptedConnector {
        fn open(&self, identity: &DeviceIdentity) -> BciResult<Box<dyn BoardSession>> {
            let mut script = self.script.lock().unwrap();
            script.opens += 1;
            if script.open_failures > 0 {
                script.open_failures -= 1;
                return Err(BciError::device("Unable to prepare streaming session"));
            }
            Ok(Box::new(ScriptedSession {
                board: identity.board,
                script: Arc::clone(&self.script),
            }))
        }
    }

    impl BoardSession for ScriptedSession {
        fn board(&self) -> BoardId {
            self.board
        }

        fn start(&mut self) -> BciResult<()> {
            Ok(())
        }

        fn poll(&mut self, window: usize) -> BciResult<SampleBuffer> {
            let mut script = self.script.lock().unwrap();
            Ok(script
                .frames
                .pop_front()
                .map(|frame| frame.tail(window))
                .unwrap_or_else(SampleBuffer::empty))
        }

        fn stop(&mut self) -> BciResult<()> {
            self.script.lock().unwrap().stopped = true;
            Ok(())
        }
    }

    struct RecordingConnector {
        sent: Sent,
        connects: Arc<Mutex<usize>>,
        fail_at: Arc<Mutex<Option<usize>>>,
    }

    /// Records messages; refuses once when the record reaches `fail_at`
    struct RecordingSink {
        target: SinkTarget,
        sent: Sent,
        fail_at: Arc<Mutex<Option<usize>>>,
    }

    impl SinkConnector for RecordingConnector {
        fn connect(&self, target: &SinkTarget) -> BciResult<Box<dyn MessageSink>> {
            *self.connects.lock().unwrap() += 1;
            Ok(Box::new(RecordingSink {
                target: target.clone(),
                sent: Arc::clone(&self.sent),
                fail_at: Arc::clone(&self.fail_at),
            }))
        }
    }

    impl MessageSink for RecordingSink {
        fn send(&mut self, tag: &str, values: &[f64]) -> BciResult<()> {
            let mut sent = self.sent.lock().unwrap();
            let mut fail_at = self.fail_at.lock().unwrap();
            if *fail_at == Some(sent.len()) {
                *fail_at = None;
                return Err(BciError::processing("send refused"));
            }
            sent.push((tag.to_string(), values.to_vec()));
            Ok(())
        }

        fn target(&self) -> &SinkTarget {
            &self.target
        }
    }

    struct Harness {
        context: BridgeContext,
        script: Arc<Mutex<Script>>,
        sent: Sent,
        connects: Arc<Mutex<usize>>,
        fail_at: Arc<Mutex<Option<usize>>>,
        start: Instant,
    }

    fn harness() -> Harness {
        let script = Arc::new(Mutex::new(Script::default()));
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));
        let connects = Arc::new(Mutex::new(0));
        let fail_at = Arc::new(Mutex::new(None));
        let start = Instant::now();

        let context = BridgeContext::with_housekeeper(
            Box::new(ScriptedConnector { script: Arc::clone(&script) }),
            Box::new(RecordingConnector {
                sent: Arc::clone(&sent),
                connects: Arc::clone(&connects),
                fail_at: Arc::clone(&fail_at),
            }),
            Housekeeper::new(HOUSEKEEPING_INTERVAL, start),
        );

        Harness { context, script, sent, connects, fail_at, start }
    }

    /// Ganglion-shaped frame (15 rows) with sines on the four EEG rows
    fn ganglion_frame(samples: usize) -> (SampleBuffer, Vec<Vec<f64>>) {
        let board = BoardId::Ganglion;
        let mut rows = vec![vec![0.0; samples]; board.row_count()];
        let mut eeg = Vec::new();

        for (idx, &row) in board.eeg_channels().iter().enumerate() {
            let freq = (idx + 1) as f64 * 2.0;
            let values: Vec<f64> = (0..samples)
                .map(|i| 10.0 * (2.0 * PI * freq * i as f64 / samples as f64).sin())
                .collect();
            rows[row] = values.clone();
            eeg.push(values);
        }
        rows[0] = (0..samples).map(|i| i as f64).collect();

        (SampleBuffer::from_rows(rows).unwrap(), eeg)
    }

    fn ganglion_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.general.board = BoardId::Ganglion;
        config.general.resample = 250;
        config
    }

    #[test]
    fn test_end_to_end_passthrough() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        h.script.lock().unwrap().frames.push_back(frame);

        let config = ganglion_config();
        let outcome = h.context.run_cycle_at(&config, h.start).unwrap();

        let report = match outcome {
            CycleOutcome::Completed(report) => report,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(report.raw_channels, 4);
        assert_eq!(report.messages_sent, 250);
        assert_eq!(report.routed_channels, vec![0, 1, 2, 3]);
        assert!(!report.housekeeping);

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 250);
        for (sample, (tag, values)) in sent.iter().enumerate() {
            assert_eq!(tag, "/wek/inputs");
            assert_eq!(values.len(), 4);
            for (channel, value) in values.iter().enumerate() {
                assert!((value - eeg[channel][sample]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_outputs_named_and_rebuilt() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            script.frames.push_back(frame.clone());
            script.frames.push_back(frame);
        }

        let mut config = ganglion_config();
        config.general.resample = 125;
        config.fft.active = true;
        h.context.run_cycle_at(&config, h.start).unwrap();

        let outputs = h.context.outputs();
        assert_eq!(
            outputs.names(),
            vec!["chan1", "chan2", "chan3", "chan4", "fft_chan1", "fft_chan2", "fft_chan3", "fft_chan4"]
        );
        assert_eq!(outputs.num_samples(), 125);
        // chan1 carries two cycles over the window; the peak lands in bin 2
        let spectrum = &outputs.get("fft_chan1").unwrap().samples;
        let peak = spectrum[..63]
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        assert_eq!(peak.0, 2);
        assert!((outputs.get("chan1").unwrap().samples[0] - eeg[0][0]).abs() < 1e-9);

        config.fft.active = false;
        h.context.run_cycle_at(&config, h.start).unwrap();
        assert_eq!(h.context.outputs().len(), 4);
        assert!(h.context.outputs().get("fft_chan1").is_none());
    }

    #[test]
    fn test_routing_selects_and_orders_values() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        h.script.lock().unwrap().frames.push_back(frame);

        let mut config = ganglion_config();
        config.fft.active = true;
        config.osc.channels = "chan3 fft_chan1 chan9 chan1".to_string();
        h.context.run_cycle_at(&config, h.start).unwrap();

        let outputs = h.context.outputs().clone();
        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 250);
        let (_, first) = &sent[0];
        assert_eq!(first.len(), 3);
        assert!((first[0] - eeg[2][0]).abs() < 1e-9);
        assert_eq!(first[1], outputs.get("fft_chan1").unwrap().samples[0]);
        assert!((first[2] - eeg[0][0]).abs() < 1e-9);
    }

    #[test]
    fn test_spectral_tokens_skipped_when_inactive() {
        let mut h = harness();
        let (frame, _) = ganglion_frame(250);
        h.script.lock().unwrap().frames.push_back(frame);

        let mut config = ganglion_config();
        config.osc.channels = "chan2 fft_chan1".to_string();
        h.context.run_cycle_at(&config, h.start).unwrap();

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 250);
        assert!(sent.iter().all(|(_, values)| values.len() == 1));
    }

    #[test]
    fn test_empty_selection_sends_nothing() {
        let mut h = harness();
        let (frame, _) = ganglion_frame(250);
        h.script.lock().unwrap().frames.push_back(frame);

        let mut config = ganglion_config();
        config.osc.channels = "chan7".to_string();
        let outcome = h.context.run_cycle_at(&config, h.start).unwrap();

        assert!(matches!(outcome, CycleOutcome::Completed(ref r) if r.messages_sent == 0));
        assert!(h.sent.lock().unwrap().is_empty());
        assert_eq!(h.context.outputs().len(), 4);
    }

    #[test]
    fn test_device_failure_retried_next_cycle() {
        let mut h = harness();
        h.script.lock().unwrap().open_failures = 1;
        let config = ganglion_config();

        let err = h.context.run_cycle_at(&config, h.start).unwrap_err();
        assert!(err.is_connection_error());
        assert!(!h.context.is_device_connected());
        assert!(!h.context.has_sink());

        let outcome = h.context.run_cycle_at(&config, h.start).unwrap();
        assert!(matches!(outcome, CycleOutcome::Skipped(SkipReason::NoData)));
        assert!(h.context.is_device_connected());
        assert_eq!(h.script.lock().unwrap().opens, 2);
    }

    #[test]
    fn test_empty_poll_skips_and_connections_persist() {
        let mut h = harness();
        let config = ganglion_config();

        for _ in 0..3 {
            let outcome = h.context.run_cycle_at(&config, h.start).unwrap();
            assert!(matches!(outcome, CycleOutcome::Skipped(SkipReason::NoData)));
        }

        assert_eq!(h.script.lock().unwrap().opens, 1);
        assert_eq!(*h.connects.lock().unwrap(), 1);
        assert_eq!(h.context.cycles_completed(), 0);
        assert!(h.context.outputs().is_empty());
    }

    #[test]
    fn test_filter_state_persists_across_cycles() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            script.frames.push_back(frame.clone());
            script.frames.push_back(frame);
        }

        let mut config = ganglion_config();
        config.filter.active = true;
        config.filter.process_noise = 0.05;
        config.filter.measurement_noise = 2.0;

        h.context.run_cycle_at(&config, h.start).unwrap();
        let after_first = *h.context.filter_bank().unwrap().state(0).unwrap();

        let mut expected = KalmanState::new(0.0, 1.0);
        for &z in &eeg[0] {
            expected = kalman_update_ref(z, expected);
        }
        assert!((after_first.estimate - expected.estimate).abs() < 1e-12);

        h.context.run_cycle_at(&config, h.start).unwrap();
        let after_second = *h.context.filter_bank().unwrap().state(0).unwrap();
        for &z in &eeg[0] {
            expected = kalman_update_ref(z, expected);
        }
        assert!((after_second.estimate - expected.estimate).abs() < 1e-12);
        assert_eq!(h.context.filter_bank().unwrap().channel_count(), 4);
    }

    fn kalman_update_ref(z: f64, prior: KalmanState) -> KalmanState {
        crate::filters::kalman_update(z, 0.05, 2.0, prior)
    }

    #[test]
    fn test_processing_error_keeps_connections() {
        let mut h = harness();
        let (frame, _) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            script.frames.push_back(frame.clone());
            script.frames.push_back(frame);
        }

        let mut config = ganglion_config();
        config.osc.channels = "chan1 chanX".to_string();
        let err = h.context.run_cycle_at(&config, h.start).unwrap_err();
        assert!(matches!(err, BciError::InvalidChannelSelection { .. }));
        assert!(h.context.is_device_connected());
        assert!(h.context.has_sink());
        assert!(h.sent.lock().unwrap().is_empty());

        config.osc.channels = "*".to_string();
        assert!(h.context.run_cycle_at(&config, h.start).is_ok());
        assert_eq!(h.script.lock().unwrap().opens, 1);
    }

    fn filtered_config() -> BridgeConfig {
        let mut config = ganglion_config();
        config.filter.active = true;
        config.filter.process_noise = 0.05;
        config.filter.measurement_noise = 2.0;
        config
    }

    #[test]
    fn test_send_failure_keeps_filter_state_and_connections() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            script.frames.push_back(frame.clone());
            script.frames.push_back(frame);
        }
        *h.fail_at.lock().unwrap() = Some(100);

        let config = filtered_config();
        let err = h.context.run_cycle_at(&config, h.start).unwrap_err();
        assert!(!err.is_connection_error());
        assert_eq!(h.sent.lock().unwrap().len(), 100);
        assert_eq!(h.context.cycles_completed(), 0);

        // The filter stage completed before emission failed
        let mut expected = KalmanState::new(0.0, 1.0);
        for &z in &eeg[0] {
            expected = kalman_update_ref(z, expected);
        }
        assert_eq!(*h.context.filter_bank().unwrap().state(0).unwrap(), expected);

        assert!(h.context.is_device_connected());
        assert!(h.context.has_sink());

        let outcome = h.context.run_cycle_at(&config, h.start).unwrap();
        assert!(matches!(outcome, CycleOutcome::Completed(ref r) if r.messages_sent == 250));
        assert_eq!(h.script.lock().unwrap().opens, 1);
        assert_eq!(*h.connects.lock().unwrap(), 1);
    }

    #[test]
    fn test_resample_failure_keeps_previous_outputs() {
        let mut h = harness();
        let (frame, eeg) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            script.frames.push_back(frame.clone());
            script.frames.push_back(frame);
        }

        let mut config = filtered_config();
        config.general.resample = 125;
        h.context.run_cycle_at(&config, h.start).unwrap();
        let published = h.context.outputs().clone();
        let sent_before = h.sent.lock().unwrap().len();

        config.general.resample = 0;
        assert!(h.context.run_cycle_at(&config, h.start).is_err());

        assert_eq!(h.context.outputs(), &published);
        assert_eq!(h.sent.lock().unwrap().len(), sent_before);

        let mut expected = KalmanState::new(0.0, 1.0);
        for _ in 0..2 {
            for &z in &eeg[0] {
                expected = kalman_update_ref(z, expected);
            }
        }
        assert_eq!(*h.context.filter_bank().unwrap().state(0).unwrap(), expected);
        assert!(h.context.is_device_connected());
        assert!(h.context.has_sink());
    }

    #[test]
    fn test_short_frame_is_resampled_to_target() {
        let mut h = harness();
        let (frame, _) = ganglion_frame(40);
        h.script.lock().unwrap().frames.push_back(frame);

        let config = ganglion_config();
        let outcome = h.context.run_cycle_at(&config, h.start).unwrap();
        match outcome {
            CycleOutcome::Completed(report) => {
                assert_eq!(report.samples_acquired, 40);
                assert_eq!(report.output_samples, 250);
                assert_eq!(report.messages_sent, 250);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_housekeeping_throttled() {
        let mut h = harness();
        let (frame, _) = ganglion_frame(250);
        {
            let mut script = h.script.lock().unwrap();
            for _ in 0..4 {
                script.frames.push_back(frame.clone());
            }
        }
        let config = ganglion_config();

        let mut ran = Vec::new();
        for offset in [10u64, 59, 61, 90] {
            let now = h.start + Duration::from_secs(offset);
            if let CycleOutcome::Completed(report) = h.context.run_cycle_at(&config, now).unwrap() {
                ran.push(report.housekeeping);
            }
        }
        assert_eq!(ran, vec![false, false, true, false]);
    }

    #[test]
    fn test_shutdown_stops_session() {
        let mut h = harness();
        let config = ganglion_config();
        h.context.run_cycle_at(&config, h.start).unwrap();

        h.context.shutdown().unwrap();
        assert!(h.script.lock().unwrap().stopped);
        assert!(!h.context.is_device_connected());
        assert!(!h.context.has_sink());
    }
}
