/// Detection module
///
/// ## Architecture
///
/// ```text
/// DetectionRunner (thread, warm-up + fixed interval)
///   ├── HandDetector (external: camera model, replay file, ...)
///   └── DetectionPipeline
///       ├── GestureMatcher (every hand x every signal)
///       ├── AcquisitionController (recording / auto-learning)
///       └── SignalStore
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let detector = ReplayDetector::open(path, &settings.detector)?;
/// let ctx = LoopContext { pipeline, process, bus, status: Some(publisher) };
/// ctx.process.lock().start(Instant::now())?;
/// let runner = DetectionRunner::spawn(Box::new(detector), ctx, settings.timing)?;
/// ```

pub mod detector;
pub mod pipeline;
pub mod replay;
pub mod runner;

pub use detector::{frames_from_landmarks, DetectorOptions, HandDetector};
pub use pipeline::{DetectionPipeline, Predictions, TickReport};
pub use replay::ReplayDetector;
pub use runner::{DetectionRunner, LoopContext, LoopTiming};
