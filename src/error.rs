// src/error.rs

use thiserror::Error;

/// Core error types for ditto
#[derive(Error, Debug)]
pub enum Error {
    /// The current hostname could not be determined
    #[error("Cannot determine current hostname: {0}")]
    HostResolution(String),

    /// Definition loading or the installed-package query failed
    #[error("Failed to read {stage}: {message}")]
    SourceRead {
        stage: &'static str,
        message: String,
    },

    /// Managed-state store errors
    #[error("Managed-state store error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// A package-manager invocation failed; earlier steps stay applied
    #[error("{step} failed for [{}]: {message}", .packages.join(", "))]
    Apply {
        step: &'static str,
        packages: Vec<String>,
        message: String,
    },

    /// Packages were changed but the managed-state store was not updated
    #[error(
        "Packages were changed but the managed-state store could not be updated: {0}. \
         Re-run `ditto sync` to record them"
    )]
    Commit(Box<Error>),

    /// An external command exited unsuccessfully
    #[error("`{command}` exited with {status}")]
    Command { command: String, status: String },

    /// Configuration file could not be read, parsed or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),
}

impl Error {
    /// Build a `SourceRead` error for the given pipeline stage
    pub fn source_read(stage: &'static str, message: impl std::fmt::Display) -> Self {
        Error::SourceRead {
            stage,
            message: message.to_string(),
        }
    }
}

/// Result type alias using ditto's Error type
pub type Result<T> = std::result::Result<T, Error>;
