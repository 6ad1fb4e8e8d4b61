//! Authentication module providing player registration, login, and token
//! management.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - JWT access tokens (60-minute default expiry)
//! - JWT refresh tokens (1-day default expiry) revocable through a blacklist
//! - Access tokens bound to their refresh token, so logout cuts both
//!
//! ## Example
//!
//! ```no_run
//! use pacman_arcade::auth::{AuthManager, RegisterRequest, TokenService};
//! use pacman_arcade::db::{Database, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     let auth = AuthManager::new(
//!         db.repositories(),
//!         "secret_pepper".to_string(),
//!         TokenService::new("jwt_secret"),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: Some("player1".to_string()),
//!         email: Some("player@example.com".to_string()),
//!         password: Some("Wakka-Wakka-42".to_string()),
//!         password_confirm: Some("Wakka-Wakka-42".to_string()),
//!     };
//!
//!     let (player, tokens) = auth.register(request).await?;
//!     println!("Registered {} with access token {}", player.username, tokens.access);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod policy;
pub mod tokens;

pub use errors::{AuthError, AuthResult, TokenError};
pub use manager::AuthManager;
pub use models::{
    AccessClaims, LoginRequest, NewPlayer, Player, PlayerId, PlayerProfile, RefreshClaims,
    RegisterRequest, TokenPair, TokenType,
};
pub use tokens::TokenService;
