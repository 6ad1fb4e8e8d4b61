//! In-process implementation of every repository trait.
//!
//! Used by the test suites and by the server's `--in-memory` mode. All three
//! tables live behind one mutex so that check-then-insert is atomic and a
//! player delete can cascade in the same critical section.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::repository::{GameSessionRepository, PlayerRepository, TokenBlacklist};
use crate::auth::{
    AuthError, AuthResult, NewPlayer, Player, PlayerId,
    policy::{EMAIL_TAKEN, USERNAME_TAKEN},
};
use crate::game::{GameError, GameResult, GameSession, LeaderboardEntry, NewGameSession, PlayerStats};
use crate::validation::ValidationErrors;

#[derive(Default)]
struct MemoryState {
    players: BTreeMap<PlayerId, Player>,
    sessions: Vec<GameSession>,
    blacklist: HashMap<Uuid, (PlayerId, DateTime<Utc>)>,
    next_player_id: PlayerId,
    next_session_id: i64,
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind, still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored sessions across all players
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of revocation entries, expired or not
    pub fn blacklist_len(&self) -> usize {
        self.lock().blacklist.len()
    }
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn create_player(&self, player: NewPlayer) -> AuthResult<Player> {
        let mut state = self.lock();

        let username = player.username.to_lowercase();
        let email = player.email.to_lowercase();
        if state
            .players
            .values()
            .any(|p| p.username.to_lowercase() == username)
        {
            return Err(AuthError::Validation(ValidationErrors::single(
                "username",
                USERNAME_TAKEN,
            )));
        }
        if state.players.values().any(|p| p.email.to_lowercase() == email) {
            return Err(AuthError::Validation(ValidationErrors::single(
                "email",
                EMAIL_TAKEN,
            )));
        }

        state.next_player_id += 1;
        let stored = Player {
            id: state.next_player_id,
            username: player.username,
            email: player.email,
            password_hash: player.password_hash,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        };
        state.players.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<Player>> {
        Ok(self
            .lock()
            .players
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn find_by_id(&self, player_id: PlayerId) -> AuthResult<Option<Player>> {
        Ok(self.lock().players.get(&player_id).cloned())
    }

    async fn username_exists(&self, username: &str) -> AuthResult<bool> {
        let username = username.to_lowercase();
        Ok(self
            .lock()
            .players
            .values()
            .any(|p| p.username.to_lowercase() == username))
    }

    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let email = email.to_lowercase();
        Ok(self
            .lock()
            .players
            .values()
            .any(|p| p.email.to_lowercase() == email))
    }

    async fn update_last_login(&self, player_id: PlayerId) -> AuthResult<()> {
        if let Some(player) = self.lock().players.get_mut(&player_id) {
            player.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_active(&self, player_id: PlayerId, active: bool) -> AuthResult<bool> {
        match self.lock().players.get_mut(&player_id) {
            Some(player) => {
                player.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_player(&self, player_id: PlayerId) -> AuthResult<bool> {
        let mut state = self.lock();
        if state.players.remove(&player_id).is_none() {
            return Ok(false);
        }
        state.sessions.retain(|s| s.player_id != player_id);
        state.blacklist.retain(|_, (owner, _)| *owner != player_id);
        Ok(true)
    }

    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TokenBlacklist for MemoryStore {
    async fn blacklist(
        &self,
        jti: Uuid,
        player_id: PlayerId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut state = self.lock();
        if state.blacklist.contains_key(&jti) {
            return Ok(false);
        }
        state.blacklist.insert(jti, (player_id, expires_at));
        Ok(true)
    }

    async fn is_blacklisted(&self, jti: Uuid) -> AuthResult<bool> {
        Ok(self.lock().blacklist.contains_key(&jti))
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let mut state = self.lock();
        let now = Utc::now();
        let before = state.blacklist.len();
        state.blacklist.retain(|_, (_, expires_at)| *expires_at >= now);
        Ok((before - state.blacklist.len()) as u64)
    }
}

#[async_trait]
impl GameSessionRepository for MemoryStore {
    async fn create_session(
        &self,
        player_id: PlayerId,
        session: &NewGameSession,
    ) -> GameResult<GameSession> {
        let mut state = self.lock();
        if !state.players.contains_key(&player_id) {
            return Err(GameError::PlayerNotFound);
        }

        state.next_session_id += 1;
        let stored = GameSession {
            id: state.next_session_id,
            player_id,
            score: session.score,
            level_reached: session.level_reached,
            duration_seconds: session.duration_seconds,
            lives_remaining: session.lives_remaining,
            dots_collected: session.dots_collected,
            ghosts_eaten: session.ghosts_eaten,
            completed_at: session.completed_at.unwrap_or_else(Utc::now),
        };
        state.sessions.push(stored.clone());
        Ok(stored)
    }

    async fn sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> GameResult<Vec<GameSession>> {
        let mut sessions: Vec<GameSession> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        sessions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(sessions)
    }

    async fn player_stats(&self, player_id: PlayerId) -> GameResult<PlayerStats> {
        let owned: Vec<GameSession> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect();
        Ok(PlayerStats::from_sessions(&owned))
    }

    async fn leaderboard(&self, limit: i64) -> GameResult<Vec<LeaderboardEntry>> {
        let state = self.lock();

        let mut per_player: BTreeMap<PlayerId, Vec<GameSession>> = BTreeMap::new();
        for session in &state.sessions {
            per_player
                .entry(session.player_id)
                .or_default()
                .push(session.clone());
        }

        let mut rows: Vec<(Player, PlayerStats)> = per_player
            .into_iter()
            .filter_map(|(player_id, sessions)| {
                let player = state.players.get(&player_id)?;
                player
                    .is_active
                    .then(|| (player.clone(), PlayerStats::from_sessions(&sessions)))
            })
            .collect();

        rows.sort_by(|(pa, a), (pb, b)| {
            b.best_score
                .cmp(&a.best_score)
                .then_with(|| b.highest_level.cmp(&a.highest_level))
                .then_with(|| pa.username.to_lowercase().cmp(&pb.username.to_lowercase()))
                .then_with(|| pa.id.cmp(&pb.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(rows
            .into_iter()
            .zip(1u32..)
            .map(|((player, stats), rank)| LeaderboardEntry {
                rank,
                player_id: player.id,
                username: player.username,
                best_score: stats.best_score,
                highest_level: stats.highest_level,
                total_games: stats.total_games,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_player(username: &str, email: &str) -> NewPlayer {
        NewPlayer {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn scored(score: i64, level_reached: i32) -> NewGameSession {
        NewGameSession {
            score,
            level_reached,
            ..NewGameSession::default()
        }
    }

    #[tokio::test]
    async fn test_create_player_assigns_sequential_ids() {
        let store = MemoryStore::new();

        let first = store
            .create_player(new_player("blinky", "blinky@example.com"))
            .await
            .expect("Failed to create player");
        let second = store
            .create_player(new_player("pinky", "pinky@example.com"))
            .await
            .expect("Failed to create second player");

        assert_eq!(first.id, 1, "First player should have ID 1");
        assert_eq!(second.id, 2, "Second player should have ID 2");
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .create_player(new_player("Blinky", "blinky@example.com"))
            .await
            .unwrap();

        let err = store
            .create_player(new_player("BLINKY", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref e) if e.has("username")));

        let err = store
            .create_player(new_player("clyde", "Blinky@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref e) if e.has("email")));
    }

    #[tokio::test]
    async fn test_find_by_username_is_exact() {
        let store = MemoryStore::new();
        store
            .create_player(new_player("Inky", "inky@example.com"))
            .await
            .unwrap();

        assert!(store.find_by_username("Inky").await.unwrap().is_some());
        assert!(store.find_by_username("inky").await.unwrap().is_none());
        assert!(store.username_exists("inky").await.unwrap());
        assert!(store.email_exists("INKY@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryStore::new();
        let player = store
            .create_player(new_player("clyde", "clyde@example.com"))
            .await
            .unwrap();
        let other = store
            .create_player(new_player("sue", "sue@example.com"))
            .await
            .unwrap();

        store.create_session(player.id, &scored(10, 1)).await.unwrap();
        store.create_session(player.id, &scored(20, 2)).await.unwrap();
        store.create_session(other.id, &scored(30, 3)).await.unwrap();
        store
            .blacklist(Uuid::new_v4(), player.id, Utc::now())
            .await
            .unwrap();

        assert!(store.delete_player(player.id).await.unwrap());
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.blacklist_len(), 0);
        assert!(!store.delete_player(player.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_session_for_unknown_player() {
        let store = MemoryStore::new();
        let err = store.create_session(42, &scored(1, 1)).await.unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound));
    }

    #[tokio::test]
    async fn test_blacklist_insert_is_idempotent() {
        let store = MemoryStore::new();
        let jti = Uuid::new_v4();
        let expires = Utc::now() + chrono::Duration::hours(1);

        assert!(store.blacklist(jti, 1, expires).await.unwrap());
        assert!(!store.blacklist(jti, 1, expires).await.unwrap());
        assert!(store.is_blacklisted(jti).await.unwrap());
        assert!(!store.is_blacklisted(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let store = MemoryStore::new();
        let live = Uuid::new_v4();
        store
            .blacklist(Uuid::new_v4(), 1, Utc::now() - chrono::Duration::minutes(5))
            .await
            .unwrap();
        store
            .blacklist(live, 1, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.is_blacklisted(live).await.unwrap());
        assert_eq!(store.blacklist_len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_newest_first_and_limited() {
        let store = MemoryStore::new();
        let player = store
            .create_player(new_player("pac", "pac@example.com"))
            .await
            .unwrap();

        let base = Utc::now();
        for (i, score) in [100, 200, 300].into_iter().enumerate() {
            let session = NewGameSession {
                score,
                completed_at: Some(base + chrono::Duration::seconds(i as i64)),
                ..NewGameSession::default()
            };
            store.create_session(player.id, &session).await.unwrap();
        }

        let sessions = store.sessions_for_player(player.id, 2).await.unwrap();
        let scores: Vec<i64> = sessions.iter().map(|s| s.score).collect();
        assert_eq!(scores, [300, 200]);
    }
}
