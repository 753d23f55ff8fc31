/// Detection loop lifecycle
///
/// Stopped -> WarmingUp -> Running -> Stopping -> Stopped. Stop may also be
/// requested during warm-up, in which case no frame is ever processed.
use std::time::{Duration, Instant};

/// State of the detection loop
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ProcessState {
    /// Detection is not running
    #[default]
    Stopped,

    /// Started, waiting for the warm-up delay before the first frame
    WarmingUp { since: Instant },

    /// Processing frames
    Running { since: Instant },

    /// Stop requested, the loop has not exited yet
    Stopping,
}

impl ProcessState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, ProcessState::Stopped)
    }

    pub fn is_warming_up(&self) -> bool {
        matches!(self, ProcessState::WarmingUp { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running { .. })
    }

    /// Started and not yet asked to stop
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessState::WarmingUp { .. } | ProcessState::Running { .. })
    }

    /// Time spent processing frames (if running)
    pub fn running_duration(&self) -> Option<Duration> {
        match self {
            ProcessState::Running { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProcessState::Stopped => "Stopped",
            ProcessState::WarmingUp { .. } => "Warming up...",
            ProcessState::Running { .. } => "Running",
            ProcessState::Stopping => "Stopping...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyRunning,
    AlreadyStopped,
    InTransition,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyRunning => write!(f, "Detection is already running"),
            TransitionError::AlreadyStopped => write!(f, "Detection is already stopped"),
            TransitionError::InTransition => {
                write!(f, "Cannot perform action during state transition")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

pub struct ProcessStateMachine {
    state: ProcessState,
}

impl ProcessStateMachine {
    pub fn new() -> Self {
        Self {
            state: ProcessState::Stopped,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Stopped -> WarmingUp
    pub fn start(&mut self, now: Instant) -> Result<(), TransitionError> {
        match self.state {
            ProcessState::Stopped => {
                self.state = ProcessState::WarmingUp { since: now };
                Ok(())
            }
            ProcessState::WarmingUp { .. } | ProcessState::Running { .. } => {
                Err(TransitionError::AlreadyRunning)
            }
            ProcessState::Stopping => Err(TransitionError::InTransition),
        }
    }

    /// WarmingUp -> Running
    pub fn mark_running(&mut self, now: Instant) -> Result<(), TransitionError> {
        match self.state {
            ProcessState::WarmingUp { .. } => {
                self.state = ProcessState::Running { since: now };
                Ok(())
            }
            _ => Err(TransitionError::InTransition),
        }
    }

    /// WarmingUp | Running -> Stopping
    pub fn stop(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ProcessState::WarmingUp { .. } | ProcessState::Running { .. } => {
                self.state = ProcessState::Stopping;
                Ok(())
            }
            ProcessState::Stopped => Err(TransitionError::AlreadyStopped),
            ProcessState::Stopping => Err(TransitionError::InTransition),
        }
    }

    /// Any -> Stopped, called by the loop on exit
    pub fn mark_stopped(&mut self) {
        self.state = ProcessState::Stopped;
    }
}

impl Default for ProcessStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
