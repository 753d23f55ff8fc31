/// Detection pipeline
///
/// The gesture engine: owns the signal store, the acquisition flags and the
/// matcher, and turns one detector result into predictions plus store
/// mutations. All store writes go through here, under the session's lock.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Settings;
use crate::error::{AcquisitionError, StoreError};
use crate::landmark::{Frame, Snapshot};
use crate::matcher::{GestureMatcher, MatchOutcome, RelativeFrame};
use crate::state::{AcquisitionController, Capture, ModeChange};
use crate::store::{default_export_path, GalleryEntry, GalleryOrder, SignalStore};

/// Recognition state per signal name
pub type Predictions = BTreeMap<String, bool>;

/// Everything one processed detector result produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub hands: usize,
    /// `None` when nothing was evaluated (no hands, or no signals)
    pub predictions: Option<Predictions>,
    pub captures: Vec<Capture>,
    pub changes: Vec<ModeChange>,
}

pub struct DetectionPipeline {
    store: SignalStore,
    acquisition: AcquisitionController,
    matcher: GestureMatcher,
    predictions: Predictions,
    last_loaded: Option<PathBuf>,
}

impl DetectionPipeline {
    pub fn new(settings: &Settings) -> Self {
        Self {
            store: SignalStore::new(),
            acquisition: AcquisitionController::from_settings(settings),
            matcher: GestureMatcher::new(settings.tolerance, settings.recognition_threshold),
            predictions: Predictions::new(),
            last_loaded: None,
        }
    }

    /// Swap in new tolerances, thresholds and durations
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.matcher = GestureMatcher::new(settings.tolerance, settings.recognition_threshold);
        self.acquisition.apply_settings(settings);
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn acquisition(&self) -> &AcquisitionController {
        &self.acquisition
    }

    pub fn matcher(&self) -> &GestureMatcher {
        &self.matcher
    }

    /// Latest published predictions
    pub fn predictions(&self) -> &Predictions {
        &self.predictions
    }

    pub fn last_loaded(&self) -> Option<&Path> {
        self.last_loaded.as_deref()
    }

    /// Where an export goes when the caller names no path
    pub fn export_path(&self) -> PathBuf {
        default_export_path(self.last_loaded())
    }

    /// Create an empty signal and select it
    pub fn create_signal(&mut self, name: &str) -> Result<Vec<ModeChange>, StoreError> {
        let name = name.trim();
        self.store.create_signal(name)?;
        Ok(self.acquisition.select(Some(name), &self.store)?.into_iter().collect())
    }

    pub fn select(&mut self, name: Option<&str>) -> Result<Option<ModeChange>, StoreError> {
        self.acquisition.select(name, &self.store)
    }

    pub fn start_recording(&mut self, now: Instant) -> Result<ModeChange, AcquisitionError> {
        self.acquisition.start_recording(now)
    }

    pub fn cancel_recording(&mut self) -> Option<ModeChange> {
        self.acquisition.cancel_recording()
    }

    pub fn toggle_learning(&mut self, now: Instant) -> ModeChange {
        self.acquisition.toggle_learning(now)
    }

    pub fn expire(&mut self, now: Instant) -> Vec<ModeChange> {
        self.acquisition.expire(now)
    }

    pub fn delete_snapshot(&mut self, signal: &str, index: usize) -> Option<Snapshot> {
        self.store.delete_snapshot(signal, index)
    }

    /// Replace the whole store (config import).
    ///
    /// Predictions and acquisition state referring to vanished signals are
    /// dropped.
    pub fn replace_store(&mut self, store: SignalStore, source: Option<PathBuf>) -> Vec<ModeChange> {
        self.store.replace_all(store);
        if source.is_some() {
            self.last_loaded = source;
        }
        let store = &self.store;
        self.predictions.retain(|name, _| store.contains(name));
        self.acquisition.reconcile(&self.store)
    }

    /// Immutable copy of the store for export
    pub fn export(&self) -> SignalStore {
        self.store.snapshot()
    }

    /// Snapshot list for display: freshest signals first while learning,
    /// otherwise the selected signal first
    pub fn gallery(&self, limit: Option<usize>) -> Vec<GalleryEntry> {
        let order = if self.acquisition.is_learning() {
            GalleryOrder::RecentFirst
        } else {
            GalleryOrder::SelectedFirst(self.acquisition.selected())
        };
        self.store.gallery(order, limit)
    }

    /// Process one detector result.
    ///
    /// Every hand is matched against the store as it was at the start of the
    /// call, so snapshots appended for one hand never influence another
    /// hand's match in the same result. A signal is recognized if any hand
    /// recognizes it.
    pub fn process_hands(&mut self, hands: &[Frame], now: Instant, captured_at: u64) -> TickReport {
        let mut report = TickReport {
            hands: hands.len(),
            changes: self.acquisition.expire(now),
            ..TickReport::default()
        };

        if hands.is_empty() {
            return report;
        }

        let baseline = self.store.snapshot();
        let mut predictions: Predictions = baseline.names().map(|name| (name.to_string(), false)).collect();

        for hand in hands {
            let live = RelativeFrame::from(hand);
            let outcomes: Vec<(String, MatchOutcome)> = baseline
                .iter()
                .map(|signal| (signal.name().to_string(), self.matcher.match_signal(&live, signal)))
                .collect();

            for (name, outcome) in &outcomes {
                if outcome.recognized {
                    predictions.insert(name.clone(), true);
                }
            }

            let effects = self
                .acquisition
                .apply_hand(&mut self.store, hand, &outcomes, captured_at);
            report.captures.extend(effects.captures);
            report.changes.extend(effects.changes);
        }

        if !baseline.is_empty() {
            tracing::trace!("Predictions: {:?}", predictions);
            self.predictions = predictions.clone();
            report.predictions = Some(predictions);
        }

        report
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}
