/*!
 * Error types for the wintrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a language-model endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt at the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while reading or writing checkpoint artifacts
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// The artifact could not be read or written
    #[error("Checkpoint I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not the JSON shape we write
    #[error("Malformed checkpoint {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A translated record lacks one of the configured field labels
    #[error("Record {index} in {path:?} has no \"{label}\" field")]
    MissingField {
        path: PathBuf,
        index: usize,
        label: String,
    },

    /// The checkpoint covers more lines than the input holds
    #[error("Checkpoint covers {resume_index} lines but the input only has {total_lines}")]
    Overrun {
        resume_index: usize,
        total_lines: usize,
    },
}

/// Errors that can occur during a translation run
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error persisting or restoring progress
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// The model reply carried no translation for a window
    #[error("No translation returned for the window starting at line {} after {} attempt(s)", .start_line + 1, .attempts)]
    EmptyTranslation {
        /// Index of the first source line of the window
        start_line: usize,
        /// Number of requests made for the window
        attempts: u32,
    },

    /// The run was stopped between windows
    #[error("Translation cancelled before line {}", .0 + 1)]
    Cancelled(usize),
}

/// Exit status for a run stopped by Ctrl-C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from checkpoint handling
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Translation(TranslationError::Cancelled(_)) => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Keep cancellation recognizable through any added context
        if let Some(TranslationError::Cancelled(line)) = error.downcast_ref::<TranslationError>() {
            return Self::Translation(TranslationError::Cancelled(*line));
        }
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
