//! Hand signal recognition engine.
//!
//! Live hand-landmark frames are matched against a library of captured
//! templates ("signals"). Signals grow by explicit recording or by
//! auto-learning, and the per-signal recognition state is broadcast to a
//! downstream transport as `name:bool,` pairs.

pub mod broadcast;
pub mod config;
pub mod detection;
pub mod error;
pub mod landmark;
pub mod matcher;
pub mod messaging;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;

pub use config::{Config, Settings};
pub use error::{AppResult, ConfigError, DetectionError, StoreError};
pub use landmark::{Frame, Landmark, Snapshot, LANDMARK_COUNT};
pub use matcher::{match_signal, GestureMatcher, MatchOutcome, Tolerance};
pub use session::Session;
pub use store::{Signal, SignalStore, MAX_SIGNALS};
