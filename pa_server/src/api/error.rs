//! API error type and its JSON rendering.
//!
//! Field validation failures render as `{"field": ["message", ...]}`; every
//! other failure renders as `{"error": "message"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pacman_arcade::{AuthError, GameError, ValidationErrors};
use serde::Serialize;
use std::fmt;

pub const CREDENTIALS_NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const TOKEN_NOT_VALID: &str = "Given token not valid";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),

    BadRequest(String),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(f, "Validation error: {}", errors),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            return ApiError::Internal(err.to_string());
        }
        match err {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::AccountDisabled => ApiError::Forbidden(err.client_message()),
            AuthError::PlayerNotFound => ApiError::NotFound(err.client_message()),
            _ => ApiError::Unauthorized(err.client_message()),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Validation(errors) => ApiError::Validation(errors),
            GameError::PlayerNotFound => ApiError::NotFound(err.client_message()),
            GameError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacman_arcade::TokenError;

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDisabled, StatusCode::FORBIDDEN),
            (AuthError::PlayerNotFound, StatusCode::NOT_FOUND),
            (AuthError::Token(TokenError::Expired), StatusCode::UNAUTHORIZED),
            (
                AuthError::Validation(ValidationErrors::single("username", "bad")),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::HashingFailed, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let err = ApiError::from(AuthError::HashingFailed);
        assert!(matches!(err, ApiError::Internal(_)));

        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_renders_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "This field is required.");
        errors.add("email", "Enter a valid email address.");

        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["username"][0], "This field is required.");
        assert_eq!(json["email"][0], "Enter a valid email address.");
    }

    #[test]
    fn test_game_error_mapping() {
        let err = ApiError::from(GameError::PlayerNotFound);
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = ApiError::from(GameError::Validation(ValidationErrors::single("score", "x")));
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
