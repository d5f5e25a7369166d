//! Error types for the Omnibar command engine.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering registration, dispatch, configuration, and persistence.

use std::path::PathBuf;

/// Top-level error type for the Omnibar core library.
#[derive(Debug, thiserror::Error)]
pub enum OmnibarError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a command action.
///
/// Actions never panic their way out; they return this and the session
/// turns it into an error notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from command registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Command '{id}' has an empty trigger")]
    EmptyTrigger { id: String },
}

/// Errors from executing a registered command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown command: {id}")]
    UnknownCommand { id: String },

    #[error("{title} failed: {source}")]
    ActionFailed {
        title: String,
        #[source]
        source: ActionError,
    },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from history persistence.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt history file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// A type alias for results using the top-level `OmnibarError`.
pub type Result<T> = std::result::Result<T, OmnibarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_registry() {
        let err = OmnibarError::Registry(RegistryError::EmptyTrigger {
            id: "note:new".into(),
        });
        assert_eq!(
            err.to_string(),
            "Registry error: Command 'note:new' has an empty trigger"
        );
    }

    #[test]
    fn test_error_display_action_failed() {
        let err = DispatchError::ActionFailed {
            title: "Start timer".into(),
            source: ActionError::new("invalid duration 'abc'"),
        };
        assert_eq!(err.to_string(), "Start timer failed: invalid duration 'abc'");
    }

    #[test]
    fn test_error_display_unknown_command() {
        let err = OmnibarError::from(DispatchError::UnknownCommand {
            id: "nope".into(),
        });
        assert_eq!(err.to_string(), "Dispatch error: Unknown command: nope");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = PersistenceError::Corrupt {
            path: PathBuf::from("/tmp/history.json"),
            message: "expected array".into(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt history file /tmp/history.json: expected array"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: OmnibarError = io_err.into();
        assert!(matches!(err, OmnibarError::Io(_)));
    }

    #[test]
    fn test_action_error_source_chain() {
        use std::error::Error;
        let err = DispatchError::ActionFailed {
            title: "Theme".into(),
            source: ActionError::new("unknown theme"),
        };
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "unknown theme");
    }
}
