/// Recording / auto-learning state machine
///
/// Decides, for each detected hand, which signals receive a new snapshot.
/// Recording and auto-learning are independent flags: both may be active at
/// once and both may append from the same frame.
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::error::{AcquisitionError, StoreError};
use crate::landmark::{Frame, Snapshot};
use crate::matcher::MatchOutcome;
use crate::store::SignalStore;

/// Summary of the active acquisition flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionMode {
    Idle,
    Recording { target: String },
    AutoLearning,
    RecordingAndLearning { target: String },
}

impl AcquisitionMode {
    pub fn description(&self) -> String {
        match self {
            AcquisitionMode::Idle => "Idle".to_string(),
            AcquisitionMode::Recording { target } => format!("Recording '{}'", target),
            AcquisitionMode::AutoLearning => "Auto-learning".to_string(),
            AcquisitionMode::RecordingAndLearning { target } => {
                format!("Recording '{}' + auto-learning", target)
            }
        }
    }
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Elapsed,
    Cancelled,
    TargetRemoved,
}

/// Which mechanism appended a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Recording,
    Learning,
}

/// A snapshot appended to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub signal: String,
    pub source: CaptureSource,
    /// Snapshot count of the signal after the append
    pub total: usize,
}

/// A transition of the acquisition flags or the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChange {
    RecordingStarted { target: String },
    RecordingStopped { target: String, reason: StopReason },
    LearningChanged { active: bool },
    SelectionChanged { selected: Option<String> },
}

/// Side effects of feeding one hand to the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandEffects {
    pub captures: Vec<Capture>,
    pub changes: Vec<ModeChange>,
}

#[derive(Debug, Clone)]
struct Recording {
    target: String,
    until: Instant,
}

#[derive(Debug, Clone)]
struct Learning {
    until: Option<Instant>,
}

pub struct AcquisitionController {
    selected: Option<String>,
    recording: Option<Recording>,
    learning: Option<Learning>,
    record_duration: Duration,
    learn_timeout: Option<Duration>,
    learning_threshold: usize,
}

impl AcquisitionController {
    pub fn new(record_duration: Duration, learn_timeout: Option<Duration>, learning_threshold: usize) -> Self {
        Self {
            selected: None,
            recording: None,
            learning: None,
            record_duration,
            learn_timeout,
            learning_threshold,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.record_duration,
            settings.learn_timeout,
            settings.learning_threshold,
        )
    }

    /// Take new durations and threshold; running deadlines keep their value
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.record_duration = settings.record_duration;
        self.learn_timeout = settings.learn_timeout;
        self.learning_threshold = settings.learning_threshold;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn is_learning(&self) -> bool {
        self.learning.is_some()
    }

    pub fn recording_target(&self) -> Option<&str> {
        self.recording.as_ref().map(|r| r.target.as_str())
    }

    pub fn mode(&self) -> AcquisitionMode {
        match (&self.recording, self.is_learning()) {
            (None, false) => AcquisitionMode::Idle,
            (None, true) => AcquisitionMode::AutoLearning,
            (Some(r), false) => AcquisitionMode::Recording {
                target: r.target.clone(),
            },
            (Some(r), true) => AcquisitionMode::RecordingAndLearning {
                target: r.target.clone(),
            },
        }
    }

    /// Change the selected signal. Selecting an unknown signal is rejected.
    pub fn select(
        &mut self,
        name: Option<&str>,
        store: &SignalStore,
    ) -> Result<Option<ModeChange>, StoreError> {
        if let Some(name) = name {
            if !store.contains(name) {
                return Err(StoreError::UnknownSignal(name.to_string()));
            }
        }
        Ok(self.set_selection(name.map(str::to_string)))
    }

    fn set_selection(&mut self, selected: Option<String>) -> Option<ModeChange> {
        if self.selected == selected {
            return None;
        }
        self.selected = selected.clone();
        Some(ModeChange::SelectionChanged { selected })
    }

    /// Start recording into the selected signal for the configured duration.
    ///
    /// Recording again while already recording re-arms the deadline.
    pub fn start_recording(&mut self, now: Instant) -> Result<ModeChange, AcquisitionError> {
        let target = self.selected.clone().ok_or(AcquisitionError::NoSelection)?;
        self.recording = Some(Recording {
            target: target.clone(),
            until: now + self.record_duration,
        });
        Ok(ModeChange::RecordingStarted { target })
    }

    pub fn cancel_recording(&mut self) -> Option<ModeChange> {
        self.stop_recording(StopReason::Cancelled)
    }

    fn stop_recording(&mut self, reason: StopReason) -> Option<ModeChange> {
        self.recording
            .take()
            .map(|r| ModeChange::RecordingStopped {
                target: r.target,
                reason,
            })
    }

    /// Flip auto-learning. Switching on arms the learn timeout, if any.
    pub fn toggle_learning(&mut self, now: Instant) -> ModeChange {
        if self.learning.take().is_some() {
            return ModeChange::LearningChanged { active: false };
        }
        self.learning = Some(Learning {
            until: self.learn_timeout.map(|timeout| now + timeout),
        });
        ModeChange::LearningChanged { active: true }
    }

    /// Expire recording and learning whose deadline has passed
    pub fn expire(&mut self, now: Instant) -> Vec<ModeChange> {
        let mut changes = Vec::new();

        if self.recording.as_ref().is_some_and(|r| now >= r.until) {
            changes.extend(self.stop_recording(StopReason::Elapsed));
        }

        let learning_elapsed = self
            .learning
            .as_ref()
            .and_then(|l| l.until)
            .is_some_and(|until| now >= until);
        if learning_elapsed {
            self.learning = None;
            changes.push(ModeChange::LearningChanged { active: false });
        }

        changes
    }

    /// Drop references to signals that no longer exist after a store swap
    pub fn reconcile(&mut self, store: &SignalStore) -> Vec<ModeChange> {
        let mut changes = Vec::new();

        let selection_gone = self.selected.as_deref().is_some_and(|name| !store.contains(name));
        if selection_gone {
            changes.extend(self.set_selection(None));
        }

        let target_gone = self
            .recording_target()
            .is_some_and(|name| !store.contains(name));
        if target_gone {
            changes.extend(self.stop_recording(StopReason::TargetRemoved));
        }

        changes
    }

    /// Apply acquisition side effects for one detected hand.
    ///
    /// `outcomes` holds this hand's match result for every known signal.
    pub fn apply_hand(
        &mut self,
        store: &mut SignalStore,
        frame: &Frame,
        outcomes: &[(String, MatchOutcome)],
        captured_at: u64,
    ) -> HandEffects {
        let mut effects = HandEffects::default();

        if self.is_learning() {
            for (name, outcome) in outcomes {
                if outcome.matched_snapshots < self.learning_threshold {
                    continue;
                }
                match store.append_snapshot(name, Snapshot::new(frame.clone(), captured_at)) {
                    Ok(total) => {
                        effects.captures.push(Capture {
                            signal: name.clone(),
                            source: CaptureSource::Learning,
                            total,
                        });
                        effects.changes.extend(self.set_selection(None));
                    }
                    Err(err) => tracing::debug!("Skipping learned snapshot: {err}"),
                }
            }
        }

        if let Some(target) = self.recording_target().map(str::to_string) {
            match store.append_snapshot(&target, Snapshot::new(frame.clone(), captured_at)) {
                Ok(total) => effects.captures.push(Capture {
                    signal: target,
                    source: CaptureSource::Recording,
                    total,
                }),
                Err(err) => {
                    tracing::warn!("Recording stopped: {err}");
                    effects.changes.extend(self.stop_recording(StopReason::TargetRemoved));
                }
            }
        }

        effects
    }
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
