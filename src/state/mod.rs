/// State management module
///
/// Acquisition flags (recording, auto-learning, selection) and the detection
/// loop lifecycle.

pub mod acquisition;
pub mod process_state;

pub use acquisition::{
    AcquisitionController, AcquisitionMode, Capture, CaptureSource, HandEffects, ModeChange,
    StopReason,
};
pub use process_state::{ProcessState, ProcessStateMachine, TransitionError};
