//! Game session error types.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Game session errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Submitted session failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Session owner does not exist
    #[error("Player not found")]
    PlayerNotFound,
}

impl From<ValidationErrors> for GameError {
    fn from(errors: ValidationErrors) -> Self {
        GameError::Validation(errors)
    }
}

impl GameError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for game session operations
pub type GameResult<T> = Result<T, GameError>;
