//! Error handling module for pkgsetup
//!
//! Fatal installer errors. Anything that reaches `main` as a `SetupError`
//! aborts the run with exit status 1; nothing is rolled back.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum SetupError {
    /// The bundled data artifact is not where staging expects it
    #[error("Cannot find data artifact: {}", .path.display())]
    MissingArtifact { path: PathBuf },

    /// The destination data directory could not be created
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying the artifact into place failed
    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requirements artifact could not be read
    #[error("Failed to read requirements from {}: {source}", .path.display())]
    Requirements {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A subprocess could not be launched
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors not covered above
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a spawn error for `program`
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
