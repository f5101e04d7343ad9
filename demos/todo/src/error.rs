//! Error types for the todo collaborators.
//!
//! None of these ever reach the reducer: the effect executor logs them and
//! the committed state stays as it is.

use thiserror::Error;

/// Failure of the persistence collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the stash failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored list could not be encoded or decoded
    #[error("Stored todo list is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of the sync collaborator
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request never got an answer (connection refused, timeout, ...)
    #[error("Sync transport failed: {0}")]
    Transport(String),

    /// The server answered and refused the update
    #[error("Sync rejected by server ({status}): {message}")]
    Rejected {
        /// HTTP status of the answer
        status: u16,
        /// Error text reported by the server
        message: String,
    },

    /// The effect could not be encoded
    #[error("Failed to encode sync message: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether trying again later may succeed
    ///
    /// Transport failures, throttling and server-side errors are transient;
    /// explicit rejections and encoding failures are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Serialization(_) => false,
        }
    }
}

/// Invalid application configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong type
    #[error("Invalid value {value:?} for {key}")]
    Parse {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_sync_errors() {
        assert!(SyncError::Transport("connection refused".into()).is_transient());
        assert!(
            SyncError::Rejected {
                status: 503,
                message: "maintenance".into()
            }
            .is_transient()
        );
        assert!(
            SyncError::Rejected {
                status: 429,
                message: "slow down".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_permanent_sync_errors() {
        assert!(
            !SyncError::Rejected {
                status: 400,
                message: "bad list".into()
            }
            .is_transient()
        );

        let encoding = serde_json::from_str::<u8>("nope").map(|_| ()).unwrap_err();
        assert!(!SyncError::from(encoding).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let error = ConfigError::Parse {
            key: "TODO_SYNC_RETRIES",
            value: "many".into(),
        };
        assert_eq!(error.to_string(), "Invalid value \"many\" for TODO_SYNC_RETRIES");

        let error = SyncError::Rejected {
            status: 409,
            message: "stale list".into(),
        };
        assert_eq!(error.to_string(), "Sync rejected by server (409): stale list");
    }
}
