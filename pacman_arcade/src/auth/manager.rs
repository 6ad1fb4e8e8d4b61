//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult, TokenError},
    models::{
        AccessClaims, LoginRequest, NewPlayer, Player, PlayerId, PlayerProfile, RegisterRequest,
        TokenPair,
    },
    policy::{self, EMAIL_TAKEN, PASSWORD_MISMATCH, USERNAME_TAKEN},
    tokens::TokenService,
};
use crate::db::{GameSessionRepository, PlayerRepository, Repositories, TokenBlacklist};
use crate::game::GameError;
use crate::validation::{ValidationErrors, required};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    players: Arc<dyn PlayerRepository>,
    sessions: Arc<dyn GameSessionRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
    tokens: TokenService,
    pepper: String,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `repositories` - Player, session and revocation stores
    /// * `pepper` - Server-side pepper for password hashing
    /// * `tokens` - JWT issuer configured with the signing secret and lifetimes
    pub fn new(repositories: Repositories, pepper: String, tokens: TokenService) -> Self {
        Self {
            players: repositories.players,
            sessions: repositories.sessions,
            blacklist: repositories.blacklist,
            tokens,
            pepper,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new player and issue their first token pair
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Any field missing or invalid, username or
    ///   email already in use (case-insensitive), weak password, or
    ///   confirmation mismatch. Nothing is persisted in that case.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<(PlayerProfile, TokenPair)> {
        let mut errors = ValidationErrors::new();

        let username = required(&mut errors, "username", request.username.as_deref());
        let email = required(&mut errors, "email", request.email.as_deref()).map(str::to_lowercase);
        let password = required(&mut errors, "password", request.password.as_deref());
        let password_confirm = required(
            &mut errors,
            "password_confirm",
            request.password_confirm.as_deref(),
        );

        if let Some(username) = username {
            if let Err(e) = policy::validate_username(username) {
                errors.extend(e);
            } else if self.players.username_exists(username).await? {
                errors.add("username", USERNAME_TAKEN);
            }
        }

        if let Some(email) = email.as_deref() {
            if let Err(e) = policy::validate_email(email) {
                errors.extend(e);
            } else if self.players.email_exists(email).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        if let Some(password) = password {
            if let Err(e) = policy::validate_password(password, username, email.as_deref()) {
                errors.extend(e);
            }
        }

        if let (Some(password), Some(confirm)) = (password, password_confirm) {
            if password != confirm {
                errors.add("password_confirm", PASSWORD_MISMATCH);
            }
        }

        errors.into_result()?;

        // All four are present once validation passed
        let (Some(username), Some(email), Some(password)) = (username, email, password) else {
            return Err(AuthError::Validation(ValidationErrors::single(
                "non_field_errors",
                "Incomplete registration",
            )));
        };

        let password_hash = self.hash_password(password)?;

        // The store re-checks uniqueness atomically; a concurrent duplicate
        // lands here as a Validation error too.
        let player = self
            .players
            .create_player(NewPlayer {
                username: username.to_string(),
                email,
                password_hash,
            })
            .await?;

        log::info!("Registered player {} ({})", player.username, player.id);

        let (tokens, _) = self.tokens.issue_pair(&player)?;
        let profile = self.profile_of(&player).await?;

        Ok((profile, tokens))
    }

    /// Login a player
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Username or password missing
    /// * `AuthError::InvalidCredentials` - Unknown username or wrong password
    /// * `AuthError::AccountDisabled` - Correct password, deactivated account
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(PlayerProfile, TokenPair)> {
        let mut errors = ValidationErrors::new();
        let username = required(&mut errors, "username", request.username.as_deref());
        let password = required(&mut errors, "password", request.password.as_deref());
        errors.into_result()?;

        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthError::InvalidCredentials);
        };

        let player = self
            .players
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.verify_password(password, &player.password_hash)?;

        if !player.is_active {
            log::warn!("Login attempt for disabled player {}", player.id);
            return Err(AuthError::AccountDisabled);
        }

        self.players.update_last_login(player.id).await?;

        let (tokens, _) = self.tokens.issue_pair(&player)?;
        let profile = self.profile_of(&player).await?;

        Ok((profile, tokens))
    }

    /// Logout by blacklisting a refresh token
    ///
    /// # Arguments
    ///
    /// * `caller` - Player authenticated by the access token on the request
    /// * `refresh_token` - Refresh token to revoke
    ///
    /// # Errors
    ///
    /// * `TokenError::Missing` - No token given
    /// * `TokenError::Malformed`, `Expired`, `WrongType` - Token unusable
    /// * `TokenError::NotOwner` - Token was issued to someone else
    /// * `TokenError::Blacklisted` - Already logged out
    pub async fn logout(&self, caller: PlayerId, refresh_token: Option<&str>) -> AuthResult<()> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::Missing)?;

        let claims = self.tokens.verify_refresh(token)?;
        if claims.sub != caller {
            return Err(TokenError::NotOwner.into());
        }

        let inserted = self
            .blacklist
            .blacklist(claims.jti, claims.sub, claims.expires_at())
            .await?;
        if !inserted {
            return Err(TokenError::Blacklisted.into());
        }

        log::info!("Player {} logged out, refresh token {} revoked", caller, claims.jti);
        Ok(())
    }

    /// Mint a new access token from a refresh token
    ///
    /// # Errors
    ///
    /// * `TokenError::Blacklisted` - Refresh token was revoked by logout
    /// * `TokenError::Expired` / `Malformed` / `WrongType` - Token unusable
    /// * `AuthError::AccountDisabled` - Owner was deactivated since login
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        if self.blacklist.is_blacklisted(claims.jti).await? {
            return Err(TokenError::Blacklisted.into());
        }

        let player = self
            .players
            .find_by_id(claims.sub)
            .await?
            .ok_or(TokenError::Malformed)?;
        if !player.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(self.tokens.issue_access(&claims)?)
    }

    /// Validate a bearer access token for a protected request
    ///
    /// Rejects tokens whose originating refresh token has been blacklisted,
    /// and tokens of deleted or deactivated players.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<AccessClaims> {
        let claims = self.tokens.verify_access(access_token)?;

        if self.blacklist.is_blacklisted(claims.sid).await? {
            return Err(TokenError::Blacklisted.into());
        }

        let player = self
            .players
            .find_by_id(claims.sub)
            .await?
            .ok_or(TokenError::Malformed)?;
        if !player.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(claims)
    }

    /// Own record plus aggregate stats
    pub async fn profile(&self, player_id: PlayerId) -> AuthResult<PlayerProfile> {
        let player = self
            .players
            .find_by_id(player_id)
            .await?
            .ok_or(AuthError::PlayerNotFound)?;
        self.profile_of(&player).await
    }

    /// Disable an account; its password keeps matching but login is refused
    pub async fn deactivate(&self, player_id: PlayerId) -> AuthResult<()> {
        if !self.players.set_active(player_id, false).await? {
            return Err(AuthError::PlayerNotFound);
        }
        log::info!("Deactivated player {player_id}");
        Ok(())
    }

    pub async fn reactivate(&self, player_id: PlayerId) -> AuthResult<()> {
        if !self.players.set_active(player_id, true).await? {
            return Err(AuthError::PlayerNotFound);
        }
        log::info!("Reactivated player {player_id}");
        Ok(())
    }

    /// Remove a player; their sessions and revoked tokens go with them
    pub async fn delete_player(&self, player_id: PlayerId) -> AuthResult<()> {
        if !self.players.delete_player(player_id).await? {
            return Err(AuthError::PlayerNotFound);
        }
        log::info!("Deleted player {player_id}");
        Ok(())
    }

    /// Drop revocation entries for tokens that have expired on their own
    pub async fn purge_expired_tokens(&self) -> AuthResult<u64> {
        let purged = self.blacklist.purge_expired().await?;
        if purged > 0 {
            log::debug!("Purged {purged} expired blacklist entries");
        }
        Ok(purged)
    }

    pub async fn health_check(&self) -> AuthResult<()> {
        self.players.health_check().await
    }

    async fn profile_of(&self, player: &Player) -> AuthResult<PlayerProfile> {
        let stats = self
            .sessions
            .player_stats(player.id)
            .await
            .map_err(|e| match e {
                GameError::Database(e) => AuthError::Database(e),
                _ => AuthError::PlayerNotFound,
            })?;
        Ok(PlayerProfile::new(player, stats))
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash; any mismatch is `InvalidCredentials`
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}
