use thiserror::Error;

/// Domain errors for the gesture engine.
///
/// Every variant here degrades to "reject this command" or "skip this tick";
/// none of them is meant to end the process. Application plumbing chains them
/// with anyhow.

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Signal name must not be empty")]
    EmptyName,

    #[error("Signal '{0}' already exists")]
    DuplicateName(String),

    #[error("Limit of {limit} signals reached")]
    LimitReached { limit: usize },

    #[error("Signal not found: {0}")]
    UnknownSignal(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Malformed signals file")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to serialize signals")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Could not determine user config directory")]
    NoConfigDir,

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Detection not running")]
    NotRunning,

    #[error("Detection already running")]
    AlreadyRunning,

    #[error("Hand detector failed")]
    DetectorFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Hand has {0} landmarks, expected 21")]
    InvalidLandmarkCount(usize),

    #[error("Detector input exhausted")]
    Exhausted,

    #[error("Failed to start detection thread")]
    ThreadSpawnFailed(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to write status payload")]
    WriteFailed(#[source] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Select a signal before recording")]
    NoSelection,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = StoreError::LimitReached { limit: 10 };
        assert_eq!(err.to_string(), "Limit of 10 signals reached");

        let err = StoreError::DuplicateName("fist".to_string());
        assert_eq!(err.to_string(), "Signal 'fist' already exists");

        let err = DetectionError::InvalidLandmarkCount(20);
        assert_eq!(err.to_string(), "Hand has 20 landmarks, expected 21");

        let err = AcquisitionError::NoSelection;
        assert_eq!(err.to_string(), "Select a signal before recording");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_err = ConfigError::LoadFailed {
            path: "/test/signals-config.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(config_err.source().is_some());
        assert_eq!(
            config_err.to_string(),
            "Failed to load configuration from /test/signals-config.json"
        );
    }

    #[test]
    fn test_malformed_keeps_parser_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::Malformed(parse_err);
        assert_eq!(err.to_string(), "Malformed signals file");
        assert!(err.source().is_some());
    }
}
