/// Event types for the application
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers.
use std::path::PathBuf;

use crate::detection::Predictions;
use crate::state::{CaptureSource, ModeChange, ProcessState, StopReason};

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    SignalCreated { name: String },

    /// A snapshot was appended to a signal
    SnapshotCaptured {
        signal: String,
        source: CaptureSource,
        total: usize,
    },

    SnapshotDeleted { signal: String, index: usize },

    /// The whole store was swapped (config import)
    StoreReplaced {
        source: Option<PathBuf>,
        signals: usize,
        snapshots: usize,
    },

    /// The store was written out (config export)
    StoreExported { path: PathBuf },

    SelectionChanged { selected: Option<String> },

    RecordingStarted { target: String },

    RecordingStopped { target: String, reason: StopReason },

    LearningToggled { active: bool },

    /// Recognition state for one processed detector result
    PredictionsUpdated { predictions: Predictions },

    EmulationChanged { signal: String, active: bool },

    /// Detection process state changed
    ProcessStateChanged {
        old_state: ProcessState,
        new_state: ProcessState,
    },

    /// A user-visible message (rejected command, import failure, ...)
    Notice { message: String },

    /// Application is shutting down
    Shutdown,
}

impl From<ModeChange> for Event {
    fn from(change: ModeChange) -> Self {
        match change {
            ModeChange::RecordingStarted { target } => Event::RecordingStarted { target },
            ModeChange::RecordingStopped { target, reason } => {
                Event::RecordingStopped { target, reason }
            }
            ModeChange::LearningChanged { active } => Event::LearningToggled { active },
            ModeChange::SelectionChanged { selected } => Event::SelectionChanged { selected },
        }
    }
}

impl Event {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            Event::SignalCreated { name } => format!("Signal created: {}", name),
            Event::SnapshotCaptured {
                signal,
                source,
                total,
            } => {
                let via = match source {
                    CaptureSource::Recording => "recorded",
                    CaptureSource::Learning => "learned",
                };
                format!("Snapshot {} for {} (total: {})", via, signal, total)
            }
            Event::SnapshotDeleted { signal, index } => {
                format!("Snapshot {} deleted from {}", index, signal)
            }
            Event::StoreReplaced {
                signals, snapshots, ..
            } => format!("Loaded {} signals ({} snapshots)", signals, snapshots),
            Event::StoreExported { path } => format!("Signals exported to {}", path.display()),
            Event::SelectionChanged { selected } => match selected {
                Some(name) => format!("Selected: {}", name),
                None => "Selection cleared".to_string(),
            },
            Event::RecordingStarted { target } => format!("Recording {}", target),
            Event::RecordingStopped { target, reason } => {
                format!("Recording {} stopped ({:?})", target, reason)
            }
            Event::LearningToggled { active } => {
                if *active {
                    "Auto-learning on".to_string()
                } else {
                    "Auto-learning off".to_string()
                }
            }
            Event::PredictionsUpdated { predictions } => {
                let recognized: Vec<&str> = predictions
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| name.as_str())
                    .collect();
                if recognized.is_empty() {
                    "No signal recognized".to_string()
                } else {
                    format!("Recognized: {}", recognized.join(", "))
                }
            }
            Event::EmulationChanged { signal, active } => {
                format!("Emulate {}: {}", signal, if *active { "on" } else { "off" })
            }
            Event::ProcessStateChanged { new_state, .. } => {
                format!("Process state: {}", new_state.description())
            }
            Event::Notice { message } => message.clone(),
            Event::Shutdown => "Shutting down".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        let event = Event::SnapshotCaptured {
            signal: "fist".to_string(),
            source: CaptureSource::Learning,
            total: 11,
        };
        assert_eq!(event.description(), "Snapshot learned for fist (total: 11)");

        let event = Event::SelectionChanged { selected: None };
        assert_eq!(event.description(), "Selection cleared");

        let predictions: Predictions = [("a".to_string(), true), ("b".to_string(), false)]
            .into_iter()
            .collect();
        let event = Event::PredictionsUpdated { predictions };
        assert_eq!(event.description(), "Recognized: a");
    }

    #[test]
    fn test_from_mode_change() {
        let event = Event::from(ModeChange::LearningChanged { active: true });
        assert!(matches!(event, Event::LearningToggled { active: true }));

        let event = Event::from(ModeChange::RecordingStopped {
            target: "wave".to_string(),
            reason: StopReason::Elapsed,
        });
        assert_eq!(event.description(), "Recording wave stopped (Elapsed)");
    }
}
