//! HTTP API for the arcade backend.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login, logout, profile and token refresh
//! - [`game`]: Finished game sessions and the leaderboard
//! - [`middleware`]: Bearer-token authentication for protected endpoints
//! - [`request_id`]: Request correlation header and HTTP metrics
//! - [`error`]: Error-to-JSON mapping shared by every handler
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                        - Store health (public)
//! POST /api/auth/register/            - Register (public)
//! POST /api/auth/login/               - Login (public)
//! POST /api/auth/token/refresh/       - New access token (public, needs refresh token)
//! POST /api/auth/logout/              - Revoke refresh token (auth required)
//! GET  /api/auth/profile/             - Own profile and stats (auth required)
//! POST /api/game/sessions/            - Record a finished game (auth required)
//! GET  /api/game/sessions/?limit=N    - Own sessions (auth required)
//! GET  /api/game/leaderboard/?limit=N - High scores (public)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pa_server::api::{AppState, create_router};
//! use pacman_arcade::auth::{AuthManager, TokenService};
//! use pacman_arcade::db::{MemoryStore, Repositories};
//! use pacman_arcade::game::GameManager;
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repositories = Repositories::in_memory(MemoryStore::new());
//! let state = AppState {
//!     game_manager: Arc::new(GameManager::new(repositories.sessions.clone())),
//!     auth_manager: Arc::new(AuthManager::new(
//!         repositories,
//!         "pepper".to_string(),
//!         TokenService::new("jwt_secret"),
//!     )),
//! };
//!
//! let app = create_router(state, Duration::from_secs(30));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod game;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use pacman_arcade::{AuthManager, GameManager};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub game_manager: Arc<GameManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// Requests running longer than `request_timeout` are answered with
/// `408 Request Timeout`.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register/", post(auth::register))
        .route("/api/auth/login/", post(auth::login))
        .route("/api/auth/token/refresh/", post(auth::refresh_token))
        .route("/api/game/leaderboard/", get(game::leaderboard));

    let protected_routes = Router::new()
        .route("/api/auth/logout/", post(auth::logout))
        .route("/api/auth/profile/", get(auth::profile))
        .route(
            "/api/game/sessions/",
            post(game::record_session).get(game::list_sessions),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the backing store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.auth_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
