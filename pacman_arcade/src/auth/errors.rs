//! Authentication error types.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Reasons a bearer or refresh token is rejected.
///
/// Kept distinct so callers can log the precise cause even where the client
/// only ever sees a generic message.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No token supplied
    #[error("Refresh token required")]
    Missing,

    /// Not a JWT, bad signature, or unexpected claims
    #[error("Token is invalid")]
    Malformed,

    /// Signature fine but past `exp`
    #[error("Token is expired")]
    Expired,

    /// Revoked through logout
    #[error("Token is blacklisted")]
    Blacklisted,

    /// An access token used where a refresh token was expected, or vice versa
    #[error("Token has wrong type")]
    WrongType,

    /// Refresh token belongs to a different player than the caller
    #[error("Token does not belong to the authenticated player")]
    NotOwner,

    /// Encoding failed while issuing
    #[error("Token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// One or more request fields failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Unknown username or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password matched but the account is deactivated
    #[error("Account is disabled")]
    AccountDisabled,

    /// Player id does not exist
    #[error("Player not found")]
    PlayerNotFound,

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Token rejected
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Validation(errors)
    }
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and signing errors are sanitized to prevent information
    /// disclosure about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
            AuthError::Token(TokenError::Signing(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the failure is on the server side rather than the caller's input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Database(_)
                | AuthError::HashingFailed
                | AuthError::Token(TokenError::Signing(_))
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_sanitizes_database_errors() {
        let err = AuthError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_internal());
    }

    #[test]
    fn test_client_message_passes_through_auth_failures() {
        assert_eq!(
            AuthError::InvalidCredentials.client_message(),
            "Invalid credentials"
        );
        assert_eq!(
            AuthError::AccountDisabled.client_message(),
            "Account is disabled"
        );
        assert_eq!(
            AuthError::Token(TokenError::Blacklisted).client_message(),
            "Token is blacklisted"
        );
        assert!(!AuthError::InvalidCredentials.is_internal());
    }

    #[test]
    fn test_jwt_expired_maps_to_expired() {
        let err: TokenError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
                .into();
        assert!(matches!(err, TokenError::Expired));

        let err: TokenError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature)
                .into();
        assert!(matches!(err, TokenError::Malformed));
    }
}
