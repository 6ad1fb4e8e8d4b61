//! Finished game sessions and the statistics derived from them.
//!
//! Game logic runs client-side; the server only receives the outcome of a
//! game once it ends and stores it immutably against the player.
//!
//! ## Example
//!
//! ```no_run
//! use pacman_arcade::db::MemoryStore;
//! use pacman_arcade::game::{GameManager, NewGameSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let games = GameManager::new(Arc::new(MemoryStore::new()));
//!
//! let session = NewGameSession { score: 1200, level_reached: 3, ..Default::default() };
//! games.record_session(1, session).await?;
//!
//! let stats = games.player_stats(1).await?;
//! println!("best score {}", stats.best_score);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod stats;

pub use errors::{GameError, GameResult};
pub use manager::GameManager;
pub use models::{GameSession, GameSessionView, LeaderboardEntry, NewGameSession, SessionId};
pub use stats::PlayerStats;
