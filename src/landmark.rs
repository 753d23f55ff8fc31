use serde::{Deserialize, Serialize, Serializer};
use std::ops::{Index, Sub};

use crate::error::DetectionError;

/// Number of landmarks the hand detector reports per hand
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark, used as the origin for relative offsets
pub const REFERENCE_INDEX: usize = 0;

/// One detected 3-D point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Sub for Landmark {
    type Output = Landmark;

    fn sub(self, rhs: Landmark) -> Landmark {
        Landmark::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// A single hand as reported by the detector: exactly 21 ordered landmarks.
///
/// Landmarks are compared positionally, so the length is fixed at the type
/// level. Anything else is rejected when converting from a `Vec`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Landmark>")]
pub struct Frame {
    points: [Landmark; LANDMARK_COUNT],
}

impl Frame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn reference(&self) -> Landmark {
        self.points[REFERENCE_INDEX]
    }

    /// Offsets of every landmark relative to the wrist (`reference - point`).
    ///
    /// Index 0 is always the zero vector.
    pub fn relative_offsets(&self) -> [Landmark; LANDMARK_COUNT] {
        let reference = self.reference();
        self.points.map(|point| reference - point)
    }

    /// Copy of this frame with one landmark replaced
    pub fn with_landmark(mut self, index: usize, landmark: Landmark) -> Self {
        self.points[index] = landmark;
        self
    }

    /// Copy of this frame moved by a constant vector
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            points: self
                .points
                .map(|p| Landmark::new(p.x + dx, p.y + dy, p.z + dz)),
        }
    }
}

impl Index<usize> for Frame {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.points[index]
    }
}

impl TryFrom<Vec<Landmark>> for Frame {
    type Error = DetectionError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        let count = points.len();
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| DetectionError::InvalidLandmarkCount(count))?;
        Ok(Self { points })
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points.as_slice().serialize(serializer)
    }
}

/// A stored template: one captured frame plus its capture time.
///
/// Serialized as `{ "points": [...], "date": <ms epoch> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub points: Frame,
    #[serde(rename = "date")]
    pub captured_at: u64,
}

impl Snapshot {
    pub fn new(points: Frame, captured_at: u64) -> Self {
        Self {
            points,
            captured_at,
        }
    }
}
