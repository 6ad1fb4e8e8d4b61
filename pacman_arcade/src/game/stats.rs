//! Aggregate statistics over a player's session history.
//!
//! Computed on demand every time; nothing is cached or maintained
//! incrementally.

use super::models::GameSession;
use serde::{Deserialize, Serialize};

/// Derived per-player totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_games: i64,
    /// Highest score, 0 with no sessions
    pub best_score: i64,
    /// Highest level reached, 0 with no sessions
    pub highest_level: i32,
}

impl PlayerStats {
    pub fn from_sessions(sessions: &[GameSession]) -> Self {
        sessions
            .iter()
            .fold(PlayerStats::default(), |acc, session| PlayerStats {
                total_games: acc.total_games + 1,
                best_score: acc.best_score.max(session.score),
                highest_level: acc.highest_level.max(session.level_reached),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(score: i64, level_reached: i32) -> GameSession {
        GameSession {
            id: 0,
            player_id: 1,
            score,
            level_reached,
            duration_seconds: 0,
            lives_remaining: 0,
            dots_collected: 0,
            ghosts_eaten: 0,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_sessions() {
        let stats = PlayerStats::from_sessions(&[]);
        assert_eq!(stats.total_games, 0);
        assert_eq!(stats.best_score, 0);
        assert_eq!(stats.highest_level, 0);
    }

    #[test]
    fn test_max_score_and_level() {
        let sessions = [session(10, 2), session(50, 1), session(30, 4)];
        let stats = PlayerStats::from_sessions(&sessions);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.best_score, 50);
        assert_eq!(stats.highest_level, 4);
    }

    #[test]
    fn test_ties_return_the_scalar() {
        let sessions = [session(70, 3), session(70, 3)];
        let stats = PlayerStats::from_sessions(&sessions);
        assert_eq!(stats.best_score, 70);
        assert_eq!(stats.highest_level, 3);
        assert_eq!(stats.total_games, 2);
    }
}
