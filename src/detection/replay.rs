/// Replay detector
///
/// Feeds recorded detector output back into the loop. Input is JSON lines:
/// one array of hands per line, each hand an array of `{x, y, z}` points.
/// A blank line is a frame with no hands.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::detector::{frames_from_landmarks, DetectorOptions, HandDetector};
use crate::error::DetectionError;
use crate::landmark::{Frame, Landmark};

pub struct ReplayDetector<R> {
    reader: R,
    max_hands: usize,
    line: String,
    exhausted: bool,
}

impl<R: BufRead + Send> ReplayDetector<R> {
    pub fn new(reader: R, options: &DetectorOptions) -> Self {
        Self {
            reader,
            max_hands: options.max_hands,
            line: String::new(),
            exhausted: false,
        }
    }
}

impl ReplayDetector<BufReader<File>> {
    pub fn open(path: &Path, options: &DetectorOptions) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?), options))
    }
}

impl<R: BufRead + Send> HandDetector for ReplayDetector<R> {
    fn detect(&mut self) -> Result<Vec<Frame>, DetectionError> {
        if self.exhausted {
            return Err(DetectionError::Exhausted);
        }

        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| DetectionError::DetectorFailed(Box::new(e)))?;
        if read == 0 {
            self.exhausted = true;
            return Err(DetectionError::Exhausted);
        }

        let line = self.line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let hands: Vec<Vec<Landmark>> =
            serde_json::from_str(line).map_err(|e| DetectionError::DetectorFailed(Box::new(e)))?;
        frames_from_landmarks(hands, self.max_hands)
    }

    fn name(&self) -> &'static str {
        "ReplayDetector"
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
