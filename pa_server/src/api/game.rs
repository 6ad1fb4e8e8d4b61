//! Game session API handlers.

use axum::{
    Json,
    extract::{
        Extension, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use pacman_arcade::{
    auth::AccessClaims,
    game::{GameSessionView, LeaderboardEntry, NewGameSession},
};
use serde::Deserialize;

use super::{AppState, error::ApiError};
use crate::metrics;

/// `?limit=N`, clamped by the game manager
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
}

/// Record a finished game for the caller.
///
/// # Request Body
///
/// ```json
/// {"score": 3330, "level_reached": 2, "duration_seconds": 125,
///  "lives_remaining": 1, "dots_collected": 240, "ghosts_eaten": 8}
/// ```
///
/// Omitted fields default to 0 (`level_reached` to 1). Responds `201` with the
/// stored session including `duration_formatted`.
pub async fn record_session(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    payload: Result<Json<NewGameSession>, JsonRejection>,
) -> Result<(StatusCode, Json<GameSessionView>), ApiError> {
    let Json(session) = payload?;

    let stored = state.game_manager.record_session(claims.sub, session).await?;
    metrics::game_session_recorded(stored.score, stored.level_reached);

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// The caller's sessions, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<GameSessionView>>, ApiError> {
    let Query(params) = params?;

    let sessions = state
        .game_manager
        .list_sessions(claims.sub, params.limit)
        .await?;

    Ok(Json(sessions.into_iter().map(GameSessionView::from).collect()))
}

/// Public high-score table.
pub async fn leaderboard(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.game_manager.leaderboard(params.limit).await?))
}
