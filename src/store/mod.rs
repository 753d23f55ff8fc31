/// Signal store module
///
/// Owns every template snapshot. The store is a copy-on-write map so that a
/// reader holding a clone never sees a half-applied mutation.
///
/// ## Layout
///
/// ```text
/// SignalStore (Arc<BTreeMap<name, Arc<Signal>>>)
///   └── Signal
///       └── Snapshot { points: Frame, date }
/// ```

pub mod persistence;
pub mod signal_store;

pub use persistence::{default_export_path, DEFAULT_SIGNALS_FILENAME};
pub use signal_store::{GalleryEntry, GalleryOrder, Signal, SignalStore, MAX_SIGNALS};
