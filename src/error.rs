//! Error types for typerush.
//!
//! Configuration problems are fatal and surface at startup. Persistence problems are
//! recovered by the caller: the session keeps its metrics and the failure is reported
//! as a warning.

use std::path::PathBuf;
use thiserror::Error;

use crate::corpus::Difficulty;

/// Deployment or data errors. Never retried.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A difficulty tier has no passages to choose from
    #[error("no passages configured for {0} difficulty")]
    EmptyTier(Difficulty),

    #[error("corpus file {name} could not be loaded: {reason}")]
    CorpusLoad { name: String, reason: String },

    #[error("corpus file {path} could not be read: {source}")]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test duration must be a positive number of seconds, got {0}")]
    InvalidDuration(u32),

    #[error("unknown difficulty '{0}' (expected easy, medium or hard)")]
    UnknownDifficulty(String),
}

/// Failures talking to the score store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("score database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("score storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored score is malformed: {0}")]
    Malformed(String),

    #[error("score store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for the application controller.
#[derive(Error, Debug)]
pub enum TypeRushError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("no signed-in user; set a user name with --user")]
    NotAuthenticated,

    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type Result<T, E = TypeRushError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tier_message_names_the_tier() {
        let err = ConfigurationError::EmptyTier(Difficulty::Hard);
        assert_eq!(err.to_string(), "no passages configured for hard difficulty");
    }

    #[test]
    fn configuration_errors_convert_transparently() {
        let err: TypeRushError = ConfigurationError::InvalidDuration(0).into();
        assert_eq!(
            err.to_string(),
            "test duration must be a positive number of seconds, got 0"
        );
    }

    #[test]
    fn persistence_errors_wrap_unavailable_store() {
        let err: TypeRushError = PersistenceError::Unavailable("offline".into()).into();
        assert!(matches!(err, TypeRushError::Persistence(_)));
        assert_eq!(err.to_string(), "score store unavailable: offline");
    }
}
