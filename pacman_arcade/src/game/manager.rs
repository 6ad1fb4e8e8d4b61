//! Game session manager.

use super::{
    errors::GameResult,
    models::{GameSession, LeaderboardEntry, NewGameSession},
    stats::PlayerStats,
};
use crate::auth::PlayerId;
use crate::db::GameSessionRepository;
use std::sync::Arc;

/// Page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on any listing
pub const MAX_PAGE_SIZE: i64 = 100;

/// Records finished games and answers stats queries
#[derive(Clone)]
pub struct GameManager {
    sessions: Arc<dyn GameSessionRepository>,
}

impl GameManager {
    pub fn new(sessions: Arc<dyn GameSessionRepository>) -> Self {
        Self { sessions }
    }

    /// Validate and persist a finished game
    ///
    /// # Errors
    ///
    /// * `GameError::Validation` - Negative counter or level below 1
    /// * `GameError::PlayerNotFound` - Owner does not exist
    pub async fn record_session(
        &self,
        player_id: PlayerId,
        session: NewGameSession,
    ) -> GameResult<GameSession> {
        session.validate()?;

        let stored = self.sessions.create_session(player_id, &session).await?;
        log::info!(
            "Player {} finished a game: score {}, level {}, {}",
            player_id,
            stored.score,
            stored.level_reached,
            stored.duration_formatted()
        );
        Ok(stored)
    }

    /// The player's own sessions, newest first
    pub async fn list_sessions(
        &self,
        player_id: PlayerId,
        limit: Option<i64>,
    ) -> GameResult<Vec<GameSession>> {
        self.sessions
            .sessions_for_player(player_id, clamp_limit(limit))
            .await
    }

    pub async fn player_stats(&self, player_id: PlayerId) -> GameResult<PlayerStats> {
        self.sessions.player_stats(player_id).await
    }

    /// Highest score per player, ties broken by level then username
    pub async fn leaderboard(&self, limit: Option<i64>) -> GameResult<Vec<LeaderboardEntry>> {
        self.sessions.leaderboard(clamp_limit(limit)).await
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
