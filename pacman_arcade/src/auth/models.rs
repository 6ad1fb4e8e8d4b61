//! Authentication data models.

use crate::game::PlayerStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player ID type
pub type PlayerId = i64;

/// Stored player record, including the password hash
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields needed to insert a new player
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Public view of a player together with their aggregate game stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub total_games: i64,
    pub best_score: i64,
    pub highest_level: i32,
}

impl PlayerProfile {
    pub fn new(player: &Player, stats: PlayerStats) -> Self {
        Self {
            id: player.id,
            username: player.username.clone(),
            email: player.email.clone(),
            created_at: player.created_at,
            total_games: stats.total_games,
            best_score: stats.best_score,
            highest_level: stats.highest_level,
        }
    }
}

/// Player registration request
///
/// Every field is optional at the type level so that an absent field is
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Player login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Issued credential pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Token flavour, embedded in the claims so one can't stand in for the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: PlayerId,
    pub username: String,
    pub token_type: TokenType,
    pub jti: Uuid,
    /// `jti` of the refresh token this access token was minted from
    pub sid: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// JWT claims for refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: PlayerId,
    pub username: String,
    pub token_type: TokenType,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl RefreshClaims {
    /// Expiry as a timestamp, for the revocation store's TTL
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
