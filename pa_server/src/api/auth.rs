//! Authentication API handlers.
//!
//! Registration, login, logout, profile and access-token refresh. Successful
//! registration and login both return the player's profile together with a
//! fresh token pair.
//!
//! # Examples
//!
//! Register a new player:
//! ```bash
//! curl -X POST http://localhost:8000/api/auth/register/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "pacman", "email": "pac@example.com",
//!        "password": "Wakka-Wakka-42", "password_confirm": "Wakka-Wakka-42"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8000/api/auth/login/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "pacman", "password": "Wakka-Wakka-42"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use pacman_arcade::{
    AuthError, TokenError,
    auth::{AccessClaims, LoginRequest, PlayerProfile, RegisterRequest, TokenPair},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AppState, error::ApiError};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PlayerProfile,
    pub tokens: TokenPair,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Logout body; the token stays untyped so a non-string value reads as an
/// invalid token rather than a malformed body
#[derive(Debug, Default, Deserialize)]
pub struct LogoutPayload {
    pub refresh_token: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshPayload {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Register a new player and log them in.
///
/// # Response
///
/// `201 Created` with `{user, tokens: {refresh, access}, message}`.
///
/// # Errors
///
/// - `400 Bad Request`: field map such as
///   `{"username": ["A user with this username already exists."]}`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = payload?;

    let (user, tokens) = state.auth_manager.register(request).await?;
    metrics::registrations_total();

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            tokens,
            message: "Registration successful",
        }),
    ))
}

/// Authenticate with username and password.
///
/// # Errors
///
/// - `400 Bad Request`: username or password missing
/// - `401 Unauthorized`: `{"error": "Invalid credentials"}`
/// - `403 Forbidden`: `{"error": "Account is disabled"}`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let username = request.username.clone().unwrap_or_default();

    match state.auth_manager.login(request).await {
        Ok((user, tokens)) => {
            metrics::login_attempts_total(true);
            Ok(Json(AuthResponse {
                user,
                tokens,
                message: "Login successful",
            }))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if matches!(e, AuthError::InvalidCredentials | AuthError::AccountDisabled) {
                logging::log_security_event(
                    "failed_login",
                    None,
                    logging::client_ip(&headers),
                    &format!("{} for username {:?}", e, username),
                );
            }
            Err(e.into())
        }
    }
}

/// Revoke a refresh token.
///
/// Access tokens minted from the revoked refresh token stop working as well.
///
/// # Errors
///
/// - `400 Bad Request`: `{"error": "Refresh token required"}` or
///   `{"error": "Invalid token"}` for any unusable, foreign or already
///   revoked token
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    headers: HeaderMap,
    payload: Result<Json<LogoutPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    // An absent or unreadable body carries no token
    let token = payload.ok().and_then(|Json(payload)| payload.refresh_token);
    let token = match token {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) => Some(token),
        Some(other) => {
            logging::log_security_event(
                "invalid_logout_token",
                Some(claims.sub),
                logging::client_ip(&headers),
                &format!("Non-string refresh token: {other}"),
            );
            return Err(ApiError::BadRequest("Invalid token".to_string()));
        }
    };

    match state
        .auth_manager
        .logout(claims.sub, token.as_deref())
        .await
    {
        Ok(()) => {
            metrics::logouts_total();
            Ok(Json(MessageResponse {
                message: "Logout successful",
            }))
        }
        Err(AuthError::Token(TokenError::Missing)) => Err(ApiError::BadRequest(
            TokenError::Missing.to_string(),
        )),
        Err(AuthError::Token(reason)) => {
            logging::log_security_event(
                "invalid_logout_token",
                Some(claims.sub),
                logging::client_ip(&headers),
                &reason.to_string(),
            );
            Err(ApiError::BadRequest("Invalid token".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// The caller's own profile with aggregate game stats.
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<PlayerProfile>, ApiError> {
    Ok(Json(state.auth_manager.profile(claims.sub).await?))
}

/// Exchange a refresh token for a new access token.
///
/// # Errors
///
/// - `400 Bad Request`: `{"refresh": ["This field is required."]}`
/// - `401 Unauthorized`: token invalid, expired or blacklisted
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshPayload>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(payload) = payload?;

    let token = payload
        .refresh
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Validation(pacman_arcade::ValidationErrors::single(
                "refresh",
                pacman_arcade::validation::REQUIRED,
            ))
        })?;

    match state.auth_manager.refresh(token).await {
        Ok(access) => {
            metrics::token_refreshes_total(true);
            Ok(Json(RefreshResponse { access }))
        }
        Err(e) => {
            metrics::token_refreshes_total(false);
            Err(e.into())
        }
    }
}
