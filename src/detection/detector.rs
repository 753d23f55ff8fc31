/// Hand detector trait and common types
///
/// The detector is an external collaborator: something that looks at the
/// current image and reports zero or more hands. Everything downstream only
/// sees validated 21-point frames.
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;
use crate::landmark::{Frame, Landmark};

/// Options handed to the underlying hand-pose model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    pub max_hands: usize,
    pub model_complexity: u8,
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.8,
            min_tracking_confidence: 0.8,
        }
    }
}

/// Detector trait
///
/// One `detect` call submits the current image and returns the hands found.
pub trait HandDetector: Send {
    fn detect(&mut self) -> Result<Vec<Frame>, DetectionError>;

    /// Get detector name (for logging)
    fn name(&self) -> &'static str;

    /// A finite source (e.g. a recording) has no more input
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<D: HandDetector + ?Sized> HandDetector for Box<D> {
    fn detect(&mut self) -> Result<Vec<Frame>, DetectionError> {
        (**self).detect()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Validate raw detector output. Any hand without exactly 21 points rejects
/// the whole result; at most `max_hands` hands are kept.
pub fn frames_from_landmarks(
    hands: Vec<Vec<Landmark>>,
    max_hands: usize,
) -> Result<Vec<Frame>, DetectionError> {
    hands
        .into_iter()
        .take(max_hands)
        .map(Frame::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LANDMARK_COUNT;

    fn hand(len: usize) -> Vec<Landmark> {
        (0..len).map(|i| Landmark::new(i as f64 * 0.01, 0.5, 0.0)).collect()
    }

    #[test]
    fn test_default_options() {
        let options = DetectorOptions::default();
        assert_eq!(options.max_hands, 2);
        assert_eq!(options.model_complexity, 1);
        assert_eq!(options.min_detection_confidence, 0.8);
        assert_eq!(options.min_tracking_confidence, 0.8);
    }

    #[test]
    fn test_frames_from_landmarks() {
        let frames = frames_from_landmarks(vec![hand(LANDMARK_COUNT), hand(LANDMARK_COUNT)], 2).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames_from_landmarks(Vec::new(), 2).unwrap().is_empty());
    }

    #[test]
    fn test_frames_from_landmarks_caps_hands() {
        let hands = vec![hand(LANDMARK_COUNT); 3];
        assert_eq!(frames_from_landmarks(hands, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_frames_from_landmarks_rejects_short_hand() {
        let result = frames_from_landmarks(vec![hand(LANDMARK_COUNT), hand(20)], 2);
        assert!(matches!(result, Err(DetectionError::InvalidLandmarkCount(20))));
    }
}
