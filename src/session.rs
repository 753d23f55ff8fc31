/// Session controller
///
/// Front door for user intents. Owns the engine (behind a single lock),
/// the detection loop handle and the status broadcaster, and reports
/// everything that happens on the event bus.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::broadcast::{StatusBroadcaster, StatusTransport};
use crate::config::Settings;
use crate::detection::{
    DetectionPipeline, DetectionRunner, HandDetector, LoopContext, Predictions, TickReport,
};
use crate::error::{AcquisitionError, AppResult, ConfigError, DetectionError, StoreError};
use crate::messaging::{Command, CommandResult, Event, EventBus};
use crate::state::{AcquisitionMode, ModeChange, ProcessState, ProcessStateMachine};
use crate::store::{GalleryEntry, SignalStore};

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    ctx: LoopContext,
    settings: Mutex<Settings>,
    runner: Mutex<Option<DetectionRunner>>,
    broadcaster: Mutex<Option<StatusBroadcaster>>,
}

impl Session {
    /// Session without a status transport
    pub fn new(settings: Settings) -> Self {
        Self::build(settings, None)
    }

    /// Session that writes status payloads to `transport`
    pub fn with_transport(settings: Settings, transport: Box<dyn StatusTransport>) -> AppResult<Self> {
        let broadcaster = StatusBroadcaster::spawn(transport, settings.broadcast_debounce)
            .context("Failed to start status broadcaster")?;
        Ok(Self::build(settings, Some(broadcaster)))
    }

    fn build(settings: Settings, broadcaster: Option<StatusBroadcaster>) -> Self {
        let ctx = LoopContext {
            pipeline: Arc::new(Mutex::new(DetectionPipeline::new(&settings))),
            process: Arc::new(Mutex::new(ProcessStateMachine::new())),
            bus: EventBus::new(),
            status: broadcaster.as_ref().map(StatusBroadcaster::publisher),
        };

        Self {
            inner: Arc::new(SessionInner {
                ctx,
                settings: Mutex::new(settings),
                runner: Mutex::new(None),
                broadcaster: Mutex::new(broadcaster),
            }),
        }
    }

    pub fn event_bus(&self) -> EventBus {
        self.inner.ctx.bus.clone()
    }

    pub fn settings(&self) -> Settings {
        self.inner.settings.lock().clone()
    }

    /// Take new settings; loop timing applies from the next start
    pub fn apply_settings(&self, settings: Settings) {
        self.inner.ctx.pipeline.lock().apply_settings(&settings);
        *self.inner.settings.lock() = settings;
    }

    /// Immutable view of the signal store
    pub fn store(&self) -> SignalStore {
        self.inner.ctx.pipeline.lock().export()
    }

    pub fn predictions(&self) -> Predictions {
        self.inner.ctx.pipeline.lock().predictions().clone()
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.inner.ctx.pipeline.lock().acquisition().mode()
    }

    pub fn selected(&self) -> Option<String> {
        self.inner
            .ctx
            .pipeline
            .lock()
            .acquisition()
            .selected()
            .map(str::to_string)
    }

    pub fn process_state(&self) -> ProcessState {
        self.inner.ctx.process.lock().state()
    }

    pub fn gallery(&self, limit: Option<usize>) -> Vec<GalleryEntry> {
        self.inner.ctx.pipeline.lock().gallery(limit)
    }

    fn publish(&self, event: Event) {
        self.inner.ctx.bus.publish(event);
    }

    fn publish_changes(&self, changes: impl IntoIterator<Item = ModeChange>) {
        self.inner.ctx.publish_report(TickReport {
            changes: changes.into_iter().collect(),
            ..TickReport::default()
        });
    }

    fn notice(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.publish(Event::Notice { message });
    }

    /// Create an empty signal and select it
    pub fn create_signal(&self, name: &str) -> Result<(), StoreError> {
        let result = self.inner.ctx.pipeline.lock().create_signal(name);
        match result {
            Ok(changes) => {
                info!("Signal created: {}", name.trim());
                self.publish(Event::SignalCreated {
                    name: name.trim().to_string(),
                });
                self.publish_changes(changes);
                Ok(())
            }
            Err(err) => {
                self.notice(err.to_string());
                Err(err)
            }
        }
    }

    pub fn select_signal(&self, name: Option<&str>) -> Result<(), StoreError> {
        let result = self.inner.ctx.pipeline.lock().select(name);
        match result {
            Ok(change) => {
                self.publish_changes(change);
                Ok(())
            }
            Err(err) => {
                self.notice(err.to_string());
                Err(err)
            }
        }
    }

    /// Record into the selected signal for the configured duration
    pub fn record(&self) -> Result<(), AcquisitionError> {
        let result = self.inner.ctx.pipeline.lock().start_recording(Instant::now());
        match result {
            Ok(change) => {
                self.publish_changes([change]);
                Ok(())
            }
            Err(err) => {
                self.notice(err.to_string());
                Err(err)
            }
        }
    }

    pub fn cancel_recording(&self) {
        let change = self.inner.ctx.pipeline.lock().cancel_recording();
        self.publish_changes(change);
    }

    /// Flip auto-learning, returning the new state
    pub fn toggle_learning(&self) -> bool {
        let change = self.inner.ctx.pipeline.lock().toggle_learning(Instant::now());
        let active = matches!(change, ModeChange::LearningChanged { active: true });
        self.publish_changes([change]);
        active
    }

    /// Remove one snapshot; returns false when nothing was removed
    pub fn delete_snapshot(&self, signal: &str, index: usize) -> bool {
        let removed = self
            .inner
            .ctx
            .pipeline
            .lock()
            .delete_snapshot(signal, index)
            .is_some();
        if removed {
            self.publish(Event::SnapshotDeleted {
                signal: signal.to_string(),
                index,
            });
        }
        removed
    }

    /// Replace the store with a parsed signals document.
    ///
    /// A malformed document leaves the store untouched.
    pub fn import_json(&self, json: &str, source: Option<PathBuf>) -> Result<(), ConfigError> {
        let store = match SignalStore::from_json(json) {
            Ok(store) => store,
            Err(err) => {
                self.notice(format!("Import failed: {err}"));
                return Err(err);
            }
        };
        self.replace_store(store, source);
        Ok(())
    }

    pub fn import_file(&self, path: &Path) -> AppResult<()> {
        let store = SignalStore::load_file(path)
            .with_context(|| format!("Failed to import signals from {}", path.display()))
            .inspect_err(|err| self.notice(format!("{err:#}")))?;
        self.replace_store(store, Some(path.to_path_buf()));
        Ok(())
    }

    fn replace_store(&self, store: SignalStore, source: Option<PathBuf>) {
        let (signals, snapshots) = (store.len(), store.total_snapshots());
        let names: Vec<String> = store.names().map(str::to_string).collect();

        let changes = self
            .inner
            .ctx
            .pipeline
            .lock()
            .replace_store(store, source.clone());

        info!("Loaded {} signals ({} snapshots)", signals, snapshots);
        if let Some(status) = &self.inner.ctx.status {
            status.retain_signals(names);
        }
        self.publish(Event::StoreReplaced {
            source,
            signals,
            snapshots,
        });
        self.publish_changes(changes);
    }

    pub fn export_json(&self) -> Result<String, ConfigError> {
        self.store().to_json()
    }

    /// Write the store to `path`, or to the last loaded filename
    /// (`signals-config.json` if nothing was loaded)
    pub fn export_file(&self, path: Option<&Path>) -> AppResult<PathBuf> {
        let (store, target) = {
            let pipeline = self.inner.ctx.pipeline.lock();
            let target = path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| pipeline.export_path());
            (pipeline.export(), target)
        };

        store
            .save_file(&target)
            .with_context(|| format!("Failed to export signals to {}", target.display()))
            .inspect_err(|err| self.notice(format!("{err:#}")))?;

        info!("Exported {} signals to {}", store.len(), target.display());
        self.publish(Event::StoreExported {
            path: target.clone(),
        });
        Ok(target)
    }

    /// Force a signal on or off in the status broadcast
    pub fn set_emulation(&self, signal: &str, active: bool) -> Result<(), StoreError> {
        if !self.inner.ctx.pipeline.lock().store().contains(signal) {
            let err = StoreError::UnknownSignal(signal.to_string());
            self.notice(err.to_string());
            return Err(err);
        }
        if let Some(status) = &self.inner.ctx.status {
            status.set_emulation(signal, active);
        }
        self.publish(Event::EmulationChanged {
            signal: signal.to_string(),
            active,
        });
        Ok(())
    }

    /// Start the detection loop with `detector`
    pub fn start_detection(&self, detector: Box<dyn HandDetector>) -> Result<(), DetectionError> {
        let mut started = Ok(());
        self.inner
            .ctx
            .transition(|process| started = process.start(Instant::now()));
        if started.is_err() {
            return Err(DetectionError::AlreadyRunning);
        }

        // A loop that ended on its own leaves its handle behind
        let previous = self.inner.runner.lock().take();
        drop(previous);

        let timing = self.inner.settings.lock().timing;
        info!("Starting detection with {}", detector.name());
        let runner = DetectionRunner::spawn(detector, self.inner.ctx.clone(), timing)?;
        *self.inner.runner.lock() = Some(runner);
        Ok(())
    }

    /// Stop the detection loop; returns once the loop thread has exited
    pub fn stop_detection(&self) -> Result<(), DetectionError> {
        let mut stopped = Ok(());
        self.inner.ctx.transition(|process| stopped = process.stop());
        if stopped.is_err() {
            return Err(DetectionError::NotRunning);
        }

        let runner = self.inner.runner.lock().take();
        if let Some(mut runner) = runner {
            runner.stop();
        }
        Ok(())
    }

    /// Block until a finite detector runs out of input
    pub fn wait_for_detection(&self) {
        let runner = self.inner.runner.lock().take();
        if let Some(runner) = runner {
            runner.join();
        }
    }

    /// Stop everything and flush the last status
    pub fn shutdown(&self) {
        let _ = self.stop_detection();
        self.publish(Event::Shutdown);
        let broadcaster = self.inner.broadcaster.lock().take();
        if let Some(mut broadcaster) = broadcaster {
            broadcaster.shutdown();
        }
    }

    /// Dispatch a command
    pub fn execute(&self, command: Command) -> CommandResult {
        tracing::debug!("Executing command: {}", command.description());

        fn done<E: std::fmt::Display>(result: Result<(), E>) -> CommandResult {
            match result {
                Ok(()) => CommandResult::Success,
                Err(err) => CommandResult::Error(err.to_string()),
            }
        }

        match command {
            Command::CreateSignal { name } => done(self.create_signal(&name)),
            Command::SelectSignal { name } => done(self.select_signal(name.as_deref())),
            Command::Record => done(self.record()),
            Command::CancelRecording => {
                self.cancel_recording();
                CommandResult::Success
            }
            Command::ToggleLearning => {
                let active = self.toggle_learning();
                CommandResult::SuccessWithValue(if active { "on" } else { "off" }.to_string())
            }
            Command::DeleteSnapshot { signal, index } => {
                if self.delete_snapshot(&signal, index) {
                    CommandResult::Success
                } else {
                    CommandResult::SuccessWithValue("Nothing to delete".to_string())
                }
            }
            Command::ImportSignals { path } => match self.import_file(&path) {
                Ok(()) => CommandResult::Success,
                Err(err) => CommandResult::Error(format!("{err:#}")),
            },
            Command::ExportSignals { path } => match self.export_file(path.as_deref()) {
                Ok(target) => CommandResult::SuccessWithValue(target.display().to_string()),
                Err(err) => CommandResult::Error(format!("{err:#}")),
            },
            Command::Emulate { signal, active } => done(self.set_emulation(&signal, active)),
            Command::StopDetection => done(self.stop_detection()),
            Command::Quit => {
                self.shutdown();
                CommandResult::Success
            }
        }
    }
}
