//! Error types for pattern building, scanning and filtering.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for findfunc operations
pub type Result<T> = std::result::Result<T, FindError>;

/// Errors that can occur while finding definitions
#[derive(Error, Debug)]
pub enum FindError {
    /// A user-supplied regex did not compile
    #[error("Invalid pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Malformed `--length` expression
    #[error("Invalid --length operation: {0}\nExpecting an integer or >N,<N,>=N,<=N,=N,==N.")]
    InvalidLength(String),

    /// Malformed integer argument
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Malformed glob in a path argument
    #[error("invalid glob pattern: {pattern}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A path could not be opened
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line source failed mid-stream (including decode failures)
    #[error("failed to read {source_id}")]
    Read {
        source_id: String,
        #[source]
        source: io::Error,
    },
}

impl FindError {
    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// True for errors caused by bad user input, as opposed to stream errors.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. }
                | Self::InvalidLength(_)
                | Self::InvalidNumber(_)
                | Self::InvalidGlob { .. }
        )
    }
}
