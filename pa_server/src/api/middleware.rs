//! Authentication middleware for protected endpoints.
//!
//! Extracts the bearer access token from the `Authorization` header, checks
//! it with the [`AuthManager`](pacman_arcade::AuthManager) (signature, expiry,
//! revocation, account state) and injects the [`AccessClaims`] into request
//! extensions for downstream handlers.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use pacman_arcade::auth::AccessClaims;
//!
//! async fn protected_handler(Extension(claims): Extension<AccessClaims>) -> String {
//!     format!("Authenticated as player {}", claims.sub)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::{
    AppState,
    error::{ApiError, CREDENTIALS_NOT_PROVIDED, TOKEN_NOT_VALID},
};

/// Authentication middleware that validates JWT tokens and injects claims.
///
/// - **Missing or non-bearer header**: `401 {"error": "Authentication credentials were not provided."}`
/// - **Invalid, expired or revoked token**: `401 {"error": "Given token not valid"}`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_NOT_PROVIDED.to_string()))?;

    match state.auth_manager.authenticate(token).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) if e.is_internal() => Err(e.into()),
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            Err(ApiError::Unauthorized(TOKEN_NOT_VALID.to_string()))
        }
    }
}
