//! Game session data models.

use crate::auth::PlayerId;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Game session ID type
pub type SessionId = i64;

const MIN_VALUE_ZERO: &str = "Ensure this value is greater than or equal to 0.";
const MIN_VALUE_ONE: &str = "Ensure this value is greater than or equal to 1.";

/// One finished game, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub score: i64,
    pub level_reached: i32,
    pub duration_seconds: i64,
    pub lives_remaining: i32,
    pub dots_collected: i32,
    pub ghosts_eaten: i32,
    pub completed_at: DateTime<Utc>,
}

impl GameSession {
    /// Duration as `MM:SS`
    pub fn duration_formatted(&self) -> String {
        Self::format_duration(self.duration_seconds)
    }

    /// Format a second count as zero-padded `MM:SS`. Minutes are not capped.
    pub fn format_duration(seconds: i64) -> String {
        let seconds = seconds.max(0);
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Result of a finished game as submitted by the client.
///
/// Omitted fields take the same defaults as the database columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewGameSession {
    pub score: i64,
    pub level_reached: i32,
    pub duration_seconds: i64,
    pub lives_remaining: i32,
    pub dots_collected: i32,
    pub ghosts_eaten: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for NewGameSession {
    fn default() -> Self {
        Self {
            score: 0,
            level_reached: 1,
            duration_seconds: 0,
            lives_remaining: 0,
            dots_collected: 0,
            ghosts_eaten: 0,
            completed_at: None,
        }
    }
}

impl NewGameSession {
    /// All counters non-negative, level at least 1
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let counters = [
            ("score", self.score),
            ("duration_seconds", self.duration_seconds),
            ("lives_remaining", i64::from(self.lives_remaining)),
            ("dots_collected", i64::from(self.dots_collected)),
            ("ghosts_eaten", i64::from(self.ghosts_eaten)),
        ];
        for (field, value) in counters {
            if value < 0 {
                errors.add(field, MIN_VALUE_ZERO);
            }
        }
        if self.level_reached < 1 {
            errors.add("level_reached", MIN_VALUE_ONE);
        }

        errors.into_result()
    }
}

/// A session as returned by the API, with the derived duration string
#[derive(Debug, Clone, Serialize)]
pub struct GameSessionView {
    #[serde(flatten)]
    pub session: GameSession,
    pub duration_formatted: String,
}

impl From<GameSession> for GameSessionView {
    fn from(session: GameSession) -> Self {
        let duration_formatted = session.duration_formatted();
        Self {
            session,
            duration_formatted,
        }
    }
}

/// One row of the high-score table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub username: String,
    pub best_score: i64,
    pub highest_level: i32,
    pub total_games: i64,
}
