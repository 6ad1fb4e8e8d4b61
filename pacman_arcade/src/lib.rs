//! # Pac-Man Arcade
//!
//! Player accounts and game-session statistics for a browser-based Pac-Man
//! style arcade game.
//!
//! The game itself runs in the browser. This library owns what has to be
//! trusted on the server side: who the player is, and what they scored.
//!
//! ## Core Modules
//!
//! - [`auth`]: Registration, login, JWT issuance, refresh and revocation
//! - [`game`]: Recording finished game sessions, stats aggregation, leaderboard
//! - [`db`]: Repository traits with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use pacman_arcade::game::{GameSession, PlayerStats};
//!
//! let stats = PlayerStats::from_sessions(&[]);
//! assert_eq!(stats.best_score, 0);
//! assert_eq!(GameSession::format_duration(125), "02:05");
//! ```

/// Authentication: credentials, tokens and the revocation list.
pub mod auth;

/// Persistence layer.
pub mod db;

/// Game sessions and derived player statistics.
pub mod game;

/// Field-keyed validation errors shared by all request types.
pub mod validation;

pub use auth::{AuthError, AuthManager, AuthResult, TokenError};
pub use db::{Database, DatabaseConfig, MemoryStore};
pub use game::{GameError, GameManager, GameResult, GameSession, PlayerStats};
pub use validation::ValidationErrors;
