use crate::landmark::{Frame, Landmark, Snapshot, LANDMARK_COUNT};
use crate::store::Signal;

pub const DEFAULT_OFFSET_X: f64 = 0.02;
pub const DEFAULT_OFFSET_Y: f64 = 0.02;
pub const DEFAULT_OFFSET_Z: f64 = 0.05;

/// Per-axis absolute tolerance applied to wrist-relative offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Tolerance {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(DEFAULT_OFFSET_X, DEFAULT_OFFSET_Y, DEFAULT_OFFSET_Z)
    }
}

/// Result of comparing one live hand against one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    /// Number of template snapshots that matched the live hand
    pub matched_snapshots: usize,
    /// `matched_snapshots` reached the recognition threshold
    pub recognized: bool,
}

/// Wrist-relative offsets of a live hand, computed once per detected hand
/// and reused against every signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeFrame {
    offsets: [Landmark; LANDMARK_COUNT],
}

impl From<&Frame> for RelativeFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            offsets: frame.relative_offsets(),
        }
    }
}

impl RelativeFrame {
    /// Check a single template snapshot against this hand.
    ///
    /// Every landmark must stay inside the closed tolerance band on every
    /// axis; one miss rejects the whole snapshot.
    pub fn matches(&self, snapshot: &Snapshot, tolerance: &Tolerance) -> bool {
        let template = snapshot.points.relative_offsets();
        template
            .iter()
            .zip(self.offsets.iter())
            .all(|(tpl, live)| {
                within(live.x, tpl.x, tolerance.x)
                    && within(live.y, tpl.y, tolerance.y)
                    && within(live.z, tpl.z, tolerance.z)
            })
    }
}

fn within(live: f64, template: f64, tolerance: f64) -> bool {
    live >= template - tolerance && live <= template + tolerance
}

/// Matcher carrying the resolved tolerance and recognition threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureMatcher {
    tolerance: Tolerance,
    recognition_threshold: usize,
}

impl GestureMatcher {
    pub fn new(tolerance: Tolerance, recognition_threshold: usize) -> Self {
        Self {
            tolerance,
            recognition_threshold,
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn recognition_threshold(&self) -> usize {
        self.recognition_threshold
    }

    /// Count matching snapshots of `signal` for an already-prepared hand
    pub fn match_signal(&self, live: &RelativeFrame, signal: &Signal) -> MatchOutcome {
        let matched_snapshots = signal
            .snapshots()
            .iter()
            .filter(|snapshot| live.matches(snapshot, &self.tolerance))
            .count();

        MatchOutcome {
            matched_snapshots,
            // An empty signal never reaches a positive threshold.
            recognized: matched_snapshots > 0 && matched_snapshots >= self.recognition_threshold,
        }
    }
}

/// One-shot comparison of a live frame against a signal
pub fn match_signal(
    live: &Frame,
    signal: &Signal,
    tolerance: Tolerance,
    recognition_threshold: usize,
) -> MatchOutcome {
    GestureMatcher::new(tolerance, recognition_threshold)
        .match_signal(&RelativeFrame::from(live), signal)
}
