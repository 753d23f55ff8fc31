/// Command types for the application
///
/// Commands represent requests to perform actions (imperative).
/// They are executed by the session.
use std::path::PathBuf;

/// Application commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an empty signal and select it
    CreateSignal { name: String },

    /// Change or clear the selected signal
    SelectSignal { name: Option<String> },

    /// Record into the selected signal for the configured duration
    Record,

    CancelRecording,

    /// Flip auto-learning
    ToggleLearning,

    DeleteSnapshot { signal: String, index: usize },

    /// Replace the store with a signals file
    ImportSignals { path: PathBuf },

    /// Write the store to `path`, or to the default export path
    ExportSignals { path: Option<PathBuf> },

    /// Force a signal on or off in the broadcast
    Emulate { signal: String, active: bool },

    /// Stop detection
    StopDetection,

    /// Quit the application
    Quit,
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command executed successfully
    Success,

    /// Command executed with a specific result
    SuccessWithValue(String),

    /// Command failed with an error
    Error(String),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, CommandResult::Error(_))
    }
}

impl Command {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::CreateSignal { name } => format!("Create signal: {}", name),
            Command::SelectSignal { name } => match name {
                Some(name) => format!("Select signal: {}", name),
                None => "Clear selection".to_string(),
            },
            Command::Record => "Record".to_string(),
            Command::CancelRecording => "Cancel recording".to_string(),
            Command::ToggleLearning => "Toggle auto-learning".to_string(),
            Command::DeleteSnapshot { signal, index } => {
                format!("Delete snapshot {} of {}", index, signal)
            }
            Command::ImportSignals { path } => format!("Import signals: {}", path.display()),
            Command::ExportSignals { path } => match path {
                Some(path) => format!("Export signals: {}", path.display()),
                None => "Export signals".to_string(),
            },
            Command::Emulate { signal, active } => {
                format!("Emulate {}: {}", signal, if *active { "on" } else { "off" })
            }
            Command::StopDetection => "Stop detection".to_string(),
            Command::Quit => "Quit application".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_description() {
        let cmd = Command::StopDetection;
        assert_eq!(cmd.description(), "Stop detection");

        let cmd = Command::SelectSignal { name: None };
        assert_eq!(cmd.description(), "Clear selection");

        let cmd = Command::DeleteSnapshot {
            signal: "fist".to_string(),
            index: 2,
        };
        assert_eq!(cmd.description(), "Delete snapshot 2 of fist");
    }

    #[test]
    fn test_command_result() {
        assert!(CommandResult::Success.is_success());
        assert!(CommandResult::SuccessWithValue("x".to_string()).is_success());
        assert!(!CommandResult::Error("no".to_string()).is_success());
    }
}
