use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::landmark::Snapshot;

/// Maximum number of signals that can be created by the user
pub const MAX_SIGNALS: usize = 10;

/// A named gesture and the template snapshots collected for it
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    snapshots: Vec<Snapshot>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snapshots: Vec::new(),
        }
    }

    pub fn with_snapshots(name: impl Into<String>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            name: name.into(),
            snapshots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    /// Most recent capture time, if any snapshot exists
    pub fn latest_capture(&self) -> Option<u64> {
        self.snapshots.iter().map(|s| s.captured_at).max()
    }
}

/// How the snapshot gallery orders signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryOrder<'a> {
    /// Signals with the freshest capture first (used while learning)
    RecentFirst,
    /// The selected signal first, the rest in store order
    SelectedFirst(Option<&'a str>),
}

/// One row of the snapshot gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub signal: String,
    /// Position in the signal's stored list, usable with `delete_snapshot`
    pub index: usize,
    /// 1-based display number, the newest snapshot carries the highest
    pub number: usize,
    pub captured_at: u64,
}

/// Mapping from signal name to signal.
///
/// Cloning is cheap and yields an immutable view; every mutation goes
/// through `Arc::make_mut`, so outstanding clones keep the old contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalStore {
    signals: Arc<BTreeMap<String, Arc<Signal>>>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-populated signals.
    ///
    /// Creation rules are not applied here: imported configs may hold more
    /// than `MAX_SIGNALS` entries. A repeated name keeps the last signal.
    pub fn from_signals(signals: impl IntoIterator<Item = Signal>) -> Self {
        let signals = signals
            .into_iter()
            .map(|signal| (signal.name.clone(), Arc::new(signal)))
            .collect();
        Self {
            signals: Arc::new(signals),
        }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name).map(|signal| signal.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values().map(|signal| signal.as_ref())
    }

    pub fn total_snapshots(&self) -> usize {
        self.signals.values().map(|signal| signal.len()).sum()
    }

    /// Add an empty signal
    pub fn create_signal(&mut self, name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.signals.contains_key(name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        if self.signals.len() >= MAX_SIGNALS {
            return Err(StoreError::LimitReached { limit: MAX_SIGNALS });
        }

        Arc::make_mut(&mut self.signals).insert(name.to_string(), Arc::new(Signal::new(name)));
        Ok(())
    }

    /// Append a snapshot, returning the signal's new snapshot count
    pub fn append_snapshot(&mut self, name: &str, snapshot: Snapshot) -> Result<usize, StoreError> {
        if !self.signals.contains_key(name) {
            return Err(StoreError::UnknownSignal(name.to_string()));
        }

        let signals = Arc::make_mut(&mut self.signals);
        let signal = signals
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownSignal(name.to_string()))?;
        let signal = Arc::make_mut(signal);
        signal.push(snapshot);
        Ok(signal.len())
    }

    /// Remove one snapshot. Unknown signal or out-of-range index is a no-op.
    pub fn delete_snapshot(&mut self, name: &str, index: usize) -> Option<Snapshot> {
        let in_range = self
            .signals
            .get(name)
            .map(|signal| index < signal.len())
            .unwrap_or(false);
        if !in_range {
            return None;
        }

        let signal = Arc::make_mut(Arc::make_mut(&mut self.signals).get_mut(name)?);
        Some(signal.snapshots.remove(index))
    }

    /// Swap in a whole new set of signals
    pub fn replace_all(&mut self, other: SignalStore) {
        self.signals = other.signals;
    }

    /// Immutable view of the current contents
    pub fn snapshot(&self) -> SignalStore {
        self.clone()
    }

    /// Flattened snapshot list for display, newest first within each signal
    pub fn gallery(&self, order: GalleryOrder<'_>, limit: Option<usize>) -> Vec<GalleryEntry> {
        let mut signals: Vec<&Signal> = self.iter().collect();
        match order {
            GalleryOrder::RecentFirst => {
                signals.sort_by(|a, b| {
                    let a = a.latest_capture().unwrap_or(0);
                    let b = b.latest_capture().unwrap_or(0);
                    b.cmp(&a)
                });
            }
            GalleryOrder::SelectedFirst(selected) => {
                signals.sort_by_key(|signal| Some(signal.name()) != selected);
            }
        }

        let entries = signals.into_iter().flat_map(|signal| {
            let mut order: Vec<usize> = (0..signal.len()).collect();
            order.sort_by(|&a, &b| {
                signal.snapshots[b]
                    .captured_at
                    .cmp(&signal.snapshots[a].captured_at)
                    .then(b.cmp(&a))
            });
            let total = signal.len();
            order
                .into_iter()
                .enumerate()
                .map(move |(position, index)| GalleryEntry {
                    signal: signal.name.clone(),
                    index,
                    number: total - position,
                    captured_at: signal.snapshots[index].captured_at,
                })
        });

        match limit {
            Some(limit) => entries.take(limit).collect(),
            None => entries.collect(),
        }
    }
}
