//! Error types for the Ideas Parking Lot CLI

use color_eyre::eyre::Report;
use parkinglot_sdk::auth::AuthError;
use parkinglot_sdk::ApiError;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file or environment issues
    #[error(transparent)]
    Config(#[from] parkinglot_common::ConfigurationError),

    /// API communication errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Identity provider errors, already phrased for the user
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Interactive prompt failures
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure with an optional hint on what to do next
    #[error("{message}")]
    Message {
        message: String,
        suggestion: Option<String>,
    },

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    pub fn message(message: impl Into<String>) -> Self {
        CliError::Message {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a suggestion; only message errors carry one
    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        match self {
            CliError::Message { message, .. } => CliError::Message {
                message,
                suggestion: Some(suggestion.into()),
            },
            other => other,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            CliError::Message { suggestion, .. } => suggestion.as_deref(),
            CliError::Api(ApiError::Unauthorized { .. }) => {
                Some("Run 'parkinglot login' to sign in again")
            }
            CliError::Auth(AuthError::UserNotLoggedIn) => Some("Run 'parkinglot login' first"),
            _ => None,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
