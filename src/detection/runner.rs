/// Detection loop
///
/// A dedicated thread that waits out the warm-up delay, then calls the
/// detector, processes the result and sleeps a fixed interval before the
/// next call. The command channel doubles as the cancellation token: every
/// wait is a `recv_timeout` on it, so a stop request ends the loop at once.
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::detector::HandDetector;
use super::pipeline::{DetectionPipeline, TickReport};
use crate::broadcast::StatusPublisher;
use crate::config::{DEFAULT_FRAME_INTERVAL_MS, DEFAULT_WARMUP_MS};
use crate::error::DetectionError;
use crate::messaging::{Event, EventBus};
use crate::state::ProcessStateMachine;
use crate::utils::epoch_millis;

/// Warm-up delay and pause between detector calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub warmup: Duration,
    pub frame_interval: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(DEFAULT_WARMUP_MS),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
        }
    }
}

enum DetectionCommand {
    Stop,
}

/// Shared handles the loop reports through
#[derive(Clone)]
pub struct LoopContext {
    pub pipeline: Arc<Mutex<DetectionPipeline>>,
    pub process: Arc<Mutex<ProcessStateMachine>>,
    pub bus: EventBus,
    pub status: Option<StatusPublisher>,
}

impl LoopContext {
    pub(crate) fn transition(&self, apply: impl FnOnce(&mut ProcessStateMachine)) {
        let (old_state, new_state) = {
            let mut process = self.process.lock();
            let old_state = process.state();
            apply(&mut process);
            (old_state, process.state())
        };
        if old_state != new_state {
            self.bus.publish(Event::ProcessStateChanged {
                old_state,
                new_state,
            });
        }
    }

    /// Forward one tick's results to subscribers and the broadcaster
    pub fn publish_report(&self, report: TickReport) {
        for change in report.changes {
            self.bus.publish(Event::from(change));
        }
        for capture in report.captures {
            self.bus.publish(Event::SnapshotCaptured {
                signal: capture.signal,
                source: capture.source,
                total: capture.total,
            });
        }
        if let Some(predictions) = report.predictions {
            if let Some(status) = &self.status {
                status.publish_predictions(predictions.clone());
            }
            self.bus.publish(Event::PredictionsUpdated { predictions });
        }
    }
}

/// Handle to a running detection loop
pub struct DetectionRunner {
    cmd_tx: Sender<DetectionCommand>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DetectionRunner {
    /// Start the loop. The process state must already be `WarmingUp`.
    pub fn spawn(
        detector: Box<dyn HandDetector>,
        ctx: LoopContext,
        timing: LoopTiming,
    ) -> Result<Self, DetectionError> {
        let (cmd_tx, cmd_rx) = unbounded();
        let thread_ctx = ctx.clone();

        let handle = thread::Builder::new()
            .name("hand-detection".to_string())
            .spawn(move || run_detection_loop(detector, thread_ctx, cmd_rx, timing))
            .map_err(|err| {
                ctx.transition(|process| process.mark_stopped());
                DetectionError::ThreadSpawnFailed(err)
            })?;

        Ok(Self {
            cmd_tx,
            handle: Some(handle),
        })
    }

    /// Ask the loop to stop and wait for it; no frame is processed afterwards
    pub fn stop(&mut self) {
        let _ = self.cmd_tx.send(DetectionCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// The thread has exited on its own (exhausted input)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Block until the loop exits on its own
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DetectionRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wait on the command channel; true means keep going
fn wait_or_stop(cmd_rx: &Receiver<DetectionCommand>, timeout: Duration) -> bool {
    match cmd_rx.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => true,
        Ok(DetectionCommand::Stop) | Err(RecvTimeoutError::Disconnected) => false,
    }
}

fn run_detection_loop(
    mut detector: Box<dyn HandDetector>,
    ctx: LoopContext,
    cmd_rx: Receiver<DetectionCommand>,
    timing: LoopTiming,
) {
    info!(
        "Detection warming up for {} ms ({})",
        timing.warmup.as_millis(),
        detector.name()
    );

    if wait_or_stop(&cmd_rx, timing.warmup) {
        let mut started = false;
        ctx.transition(|process| started = process.mark_running(Instant::now()).is_ok());

        if started {
            info!("Detection running");
            let mut frames: u64 = 0;
            loop {
                let now = Instant::now();
                match detector.detect() {
                    Ok(hands) => {
                        frames += 1;
                        let report = ctx.pipeline.lock().process_hands(&hands, now, epoch_millis());
                        ctx.publish_report(report);
                    }
                    Err(DetectionError::Exhausted) => {
                        info!("Detector input exhausted after {} frames", frames);
                        break;
                    }
                    Err(err) => {
                        debug!("Detection failed: {err}");
                        let changes = ctx.pipeline.lock().expire(now);
                        ctx.publish_report(TickReport {
                            changes,
                            ..TickReport::default()
                        });
                    }
                }

                if detector.is_exhausted() || !wait_or_stop(&cmd_rx, timing.frame_interval) {
                    break;
                }
            }
        } else {
            warn!("Detection stopped before warm-up completed");
        }
    }

    ctx.transition(|process| process.mark_stopped());
    info!("Detection stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::landmark::{Frame, Landmark, Snapshot};
    use crate::store::{Signal, SignalStore};
    use std::collections::VecDeque;

    struct Scripted {
        frames: VecDeque<Result<Vec<Frame>, DetectionError>>,
    }

    impl HandDetector for Scripted {
        fn detect(&mut self) -> Result<Vec<Frame>, DetectionError> {
            self.frames.pop_front().unwrap_or(Err(DetectionError::Exhausted))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn hand() -> Frame {
        Frame::new(std::array::from_fn(|i| Landmark::new(0.3 + i as f64 * 0.02, 0.7, 0.0)))
    }

    fn context() -> LoopContext {
        let mut pipeline = DetectionPipeline::new(&Settings::default());
        pipeline.replace_store(
            SignalStore::from_signals(vec![Signal::with_snapshots(
                "flat",
                vec![Snapshot::new(hand(), 1); 3],
            )]),
            None,
        );
        LoopContext {
            pipeline: Arc::new(Mutex::new(pipeline)),
            process: Arc::new(Mutex::new(ProcessStateMachine::new())),
            bus: EventBus::new(),
            status: None,
        }
    }

    fn fast() -> LoopTiming {
        LoopTiming {
            warmup: Duration::from_millis(5),
            frame_interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_default_timing() {
        let timing = LoopTiming::default();
        assert_eq!(timing.warmup, Duration::from_millis(5000));
        assert_eq!(timing.frame_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_loop_processes_until_exhausted_and_swallows_errors() {
        let ctx = context();
        let (events, _id) = ctx.bus.subscribe();
        ctx.process.lock().start(Instant::now()).unwrap();

        let detector = Scripted {
            frames: VecDeque::from(vec![
                Ok(vec![hand()]),
                Err(DetectionError::DetectorFailed("camera hiccup".into())),
                Ok(vec![]),
                Ok(vec![hand()]),
            ]),
        };
        let runner = DetectionRunner::spawn(Box::new(detector), ctx.clone(), fast()).unwrap();
        runner.join();

        let predictions: Vec<_> = events
            .try_iter()
            .filter_map(|event| match event {
                Event::PredictionsUpdated { predictions } => Some(predictions),
                _ => None,
            })
            .collect();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.get("flat") == Some(&true)));
        assert!(ctx.process.lock().state().is_stopped());
    }

    #[test]
    fn test_stop_during_warmup_processes_nothing() {
        let ctx = context();
        ctx.process.lock().start(Instant::now()).unwrap();

        let detector = Scripted {
            frames: VecDeque::from(vec![Ok(vec![hand()])]),
        };
        let timing = LoopTiming {
            warmup: Duration::from_secs(60),
            frame_interval: Duration::from_millis(1),
        };
        let mut runner = DetectionRunner::spawn(Box::new(detector), ctx.clone(), timing).unwrap();
        assert!(ctx.process.lock().state().is_warming_up());

        ctx.process.lock().stop().unwrap();
        runner.stop();

        assert!(ctx.pipeline.lock().predictions().is_empty());
        assert!(ctx.process.lock().state().is_stopped());
    }
}
