//! Repository trait definitions for testability and dependency injection.
//!
//! Services only ever see these traits. [`PgPlayerRepository`] and friends
//! back them with PostgreSQL; [`MemoryStore`](super::MemoryStore) backs all
//! three with a single in-process map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::auth::{
    AuthError, AuthResult, NewPlayer, Player, PlayerId,
    policy::{EMAIL_TAKEN, USERNAME_TAKEN},
};
use crate::game::{GameError, GameResult, GameSession, LeaderboardEntry, NewGameSession, PlayerStats};
use crate::validation::ValidationErrors;

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Insert a player. Username and email uniqueness (case-insensitive) is
    /// enforced here, not by the caller's pre-check, and surfaces as
    /// `AuthError::Validation`.
    async fn create_player(&self, player: NewPlayer) -> AuthResult<Player>;

    /// Find player by exact username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<Player>>;

    /// Find player by ID
    async fn find_by_id(&self, player_id: PlayerId) -> AuthResult<Option<Player>>;

    /// Case-insensitive username lookup
    async fn username_exists(&self, username: &str) -> AuthResult<bool>;

    /// Case-insensitive email lookup
    async fn email_exists(&self, email: &str) -> AuthResult<bool>;

    /// Update player's last login timestamp
    async fn update_last_login(&self, player_id: PlayerId) -> AuthResult<()>;

    /// Toggle the active flag. Returns `false` if the player does not exist.
    async fn set_active(&self, player_id: PlayerId, active: bool) -> AuthResult<bool>;

    /// Delete a player together with their sessions and revoked tokens.
    /// Returns `false` if the player does not exist.
    async fn delete_player(&self, player_id: PlayerId) -> AuthResult<bool>;

    /// Cheap round trip to the store
    async fn health_check(&self) -> AuthResult<()>;
}

/// Revocation store for refresh tokens, keyed by `jti`
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Record a revoked token. Returns `false` if it was already present.
    async fn blacklist(
        &self,
        jti: Uuid,
        player_id: PlayerId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// Whether `jti` has been revoked
    async fn is_blacklisted(&self, jti: Uuid) -> AuthResult<bool>;

    /// Drop entries whose token would have expired anyway
    async fn purge_expired(&self) -> AuthResult<u64>;
}

/// Trait for game session repository operations
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    /// Persist a validated session
    async fn create_session(
        &self,
        player_id: PlayerId,
        session: &NewGameSession,
    ) -> GameResult<GameSession>;

    /// Player's sessions, newest first
    async fn sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> GameResult<Vec<GameSession>>;

    /// Aggregate stats over every session the player owns
    async fn player_stats(&self, player_id: PlayerId) -> GameResult<PlayerStats>;

    /// Best score per active player, ranked
    async fn leaderboard(&self, limit: i64) -> GameResult<Vec<LeaderboardEntry>>;
}

const PLAYER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, created_at, last_login";

const SESSION_COLUMNS: &str = "id, player_id, score, level_reached, duration_seconds, \
     lives_remaining, dots_collected, ghosts_eaten, completed_at";

fn player_from_row(row: &PgRow) -> Player {
    Player {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        last_login: row.get("last_login"),
    }
}

fn session_from_row(row: &PgRow) -> GameSession {
    GameSession {
        id: row.get("id"),
        player_id: row.get("player_id"),
        score: row.get("score"),
        level_reached: row.get("level_reached"),
        duration_seconds: row.get("duration_seconds"),
        lives_remaining: row.get("lives_remaining"),
        dots_collected: row.get("dots_collected"),
        ghosts_eaten: row.get("ghosts_eaten"),
        completed_at: row.get("completed_at"),
    }
}

/// Translate a unique-index violation on `players` into the matching field error
fn uniqueness_error(err: &sqlx::Error) -> Option<ValidationErrors> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some("players_username_lower_key") => {
            Some(ValidationErrors::single("username", USERNAME_TAKEN))
        }
        Some("players_email_lower_key") => Some(ValidationErrors::single("email", EMAIL_TAKEN)),
        _ => None,
    }
}

/// Default PostgreSQL implementation of `PlayerRepository`
#[derive(Clone)]
pub struct PgPlayerRepository {
    pool: PgPool,
}

impl PgPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for PgPlayerRepository {
    async fn create_player(&self, player: NewPlayer) -> AuthResult<Player> {
        let sql = format!(
            "INSERT INTO players (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {PLAYER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&player.username)
            .bind(&player.email)
            .bind(&player.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match uniqueness_error(&e) {
                Some(errors) => AuthError::Validation(errors),
                None => AuthError::Database(e),
            })?;

        Ok(player_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<Player>> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(player_from_row))
    }

    async fn find_by_id(&self, player_id: PlayerId) -> AuthResult<Option<Player>> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(player_from_row))
    }

    async fn username_exists(&self, username: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 FROM players WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 FROM players WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn update_last_login(&self, player_id: PlayerId) -> AuthResult<()> {
        sqlx::query("UPDATE players SET last_login = NOW() WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_active(&self, player_id: PlayerId, active: bool) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE players SET is_active = $2 WHERE id = $1")
            .bind(player_id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_player(&self, player_id: PlayerId) -> AuthResult<bool> {
        // game_sessions and blacklisted_tokens go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> AuthResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `TokenBlacklist`
#[derive(Clone)]
pub struct PgTokenBlacklist {
    pool: PgPool,
}

impl PgTokenBlacklist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenBlacklist for PgTokenBlacklist {
    async fn blacklist(
        &self,
        jti: Uuid,
        player_id: PlayerId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO blacklisted_tokens (jti, player_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(player_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_blacklisted(&self, jti: Uuid) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 FROM blacklisted_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Default PostgreSQL implementation of `GameSessionRepository`
#[derive(Clone)]
pub struct PgGameSessionRepository {
    pool: PgPool,
}

impl PgGameSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameSessionRepository for PgGameSessionRepository {
    async fn create_session(
        &self,
        player_id: PlayerId,
        session: &NewGameSession,
    ) -> GameResult<GameSession> {
        let sql = format!(
            "INSERT INTO game_sessions (player_id, score, level_reached, duration_seconds, \
             lives_remaining, dots_collected, ghosts_eaten, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW())) \
             RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(player_id)
            .bind(session.score)
            .bind(session.level_reached)
            .bind(session.duration_seconds)
            .bind(session.lives_remaining)
            .bind(session.dots_collected)
            .bind(session.ghosts_eaten)
            .bind(session.completed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let unknown_player = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
                );
                if unknown_player {
                    GameError::PlayerNotFound
                } else {
                    GameError::Database(e)
                }
            })?;

        Ok(session_from_row(&row))
    }

    async fn sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> GameResult<Vec<GameSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions WHERE player_id = $1 \
             ORDER BY completed_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(player_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn player_stats(&self, player_id: PlayerId) -> GameResult<PlayerStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_games,
                   COALESCE(MAX(score), 0) AS best_score,
                   COALESCE(MAX(level_reached), 0) AS highest_level
            FROM game_sessions
            WHERE player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(PlayerStats {
            total_games: row.get("total_games"),
            best_score: row.get("best_score"),
            highest_level: row.get("highest_level"),
        })
    }

    async fn leaderboard(&self, limit: i64) -> GameResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id AS player_id,
                   p.username,
                   MAX(s.score) AS best_score,
                   MAX(s.level_reached) AS highest_level,
                   COUNT(*) AS total_games
            FROM game_sessions s
            JOIN players p ON p.id = s.player_id
            WHERE p.is_active
            GROUP BY p.id, p.username
            ORDER BY best_score DESC, highest_level DESC, LOWER(p.username) ASC, p.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .zip(1u32..)
            .map(|(row, rank)| LeaderboardEntry {
                rank,
                player_id: row.get("player_id"),
                username: row.get("username"),
                best_score: row.get("best_score"),
                highest_level: row.get("highest_level"),
                total_games: row.get("total_games"),
            })
            .collect())
    }
}
