//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chrono::Duration;
use pacman_arcade::db::{DatabaseConfig, DatabaseConfigError};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8000);

/// Longest accepted token lifetime; keeps `now + ttl` inside chrono's range
const MAX_TOKEN_TTL: Duration = Duration::days(3650);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration; `None` runs on the in-memory store
    pub database: Option<DatabaseConfig>,
    /// Security configuration
    pub security: SecurityConfig,
    /// Token lifetimes
    pub tokens: TokenConfig,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Prometheus scrape address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

/// JWT lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    pub access_ttl_minutes: i64,
    pub refresh_ttl_hours: i64,
}

impl TokenConfig {
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        bounded_ttl(
            "ACCESS_TOKEN_TTL_MINUTES",
            Duration::try_minutes(self.access_ttl_minutes),
        )
    }

    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        bounded_ttl(
            "REFRESH_TOKEN_TTL_HOURS",
            Duration::try_hours(self.refresh_ttl_hours),
        )
    }
}

fn bounded_ttl(var: &str, ttl: Option<Duration>) -> Result<Duration, ConfigError> {
    match ttl {
        Some(ttl) if ttl <= MAX_TOKEN_TTL => Ok(ttl),
        _ => Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("Must not exceed {} days", MAX_TOKEN_TTL.num_days()),
        }),
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_minutes: 60,
            refresh_ttl_hours: 24,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `in_memory` - Skip PostgreSQL entirely
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let database = if in_memory {
            None
        } else {
            let database_url = database_url_override
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .unwrap_or_else(|| DatabaseConfig::development().database_url);
            Some(DatabaseConfig::from_env_with_url(database_url)?)
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let defaults = TokenConfig::default();
        let tokens = TokenConfig {
            access_ttl_minutes: parse_env_or("ACCESS_TOKEN_TTL_MINUTES", defaults.access_ttl_minutes)?,
            refresh_ttl_hours: parse_env_or("REFRESH_TOKEN_TTL_HOURS", defaults.refresh_ttl_hours)?,
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) => Some(parse_value("METRICS_BIND", &value)?),
            Err(_) => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            security: SecurityConfig {
                jwt_secret,
                password_pepper,
            },
            tokens,
            request_timeout_secs: parse_env_or("REQUEST_TIMEOUT_SECS", 30)?,
            metrics_bind,
        })
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.tokens.access_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_MINUTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.tokens.refresh_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.tokens.access_ttl()? >= self.tokens.refresh_ttl()? {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_MINUTES".to_string(),
                reason: format!(
                    "Must be shorter than the refresh token lifetime ({}h)",
                    self.tokens.refresh_ttl_hours
                ),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(database) = &self.database {
            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed DB_MAX_CONNECTIONS ({})",
                        database.max_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseConfigError),
}

/// Read an environment variable, falling back to `default` when unset
fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("Cannot parse {value:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: Some(DatabaseConfig {
                database_url: "test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            }),
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                password_pepper: "a".repeat(16),
            },
            tokens: TokenConfig::default(),
            request_timeout_secs: 30,
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid_config();
        config.security.jwt_secret = "short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_short_pepper_rejected() {
        let mut config = valid_config();
        config.security.password_pepper = "pepper".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_ttl_must_be_shorter_than_refresh() {
        let mut config = valid_config();
        config.tokens = TokenConfig {
            access_ttl_minutes: 120,
            refresh_ttl_hours: 1,
        };

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref var, .. } if var == "ACCESS_TOKEN_TTL_MINUTES")
        );
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = valid_config();
        config.tokens.refresh_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_bounds_checked() {
        let mut config = valid_config();
        if let Some(database) = config.database.as_mut() {
            database.min_connections = 50;
        }
        assert!(config.validate().is_err());

        // Without a database the pool settings are irrelevant
        config.database = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_value() {
        let port: u64 = parse_value("REQUEST_TIMEOUT_SECS", " 45 ").unwrap();
        assert_eq!(port, 45);

        let addr: SocketAddr = parse_value("METRICS_BIND", "0.0.0.0:9090").unwrap();
        assert_eq!(addr.port(), 9090);

        let err = parse_value::<u64>("REQUEST_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_token_config_durations() {
        let tokens = TokenConfig::default();
        assert_eq!(tokens.access_ttl().unwrap(), Duration::minutes(60));
        assert_eq!(tokens.refresh_ttl().unwrap(), Duration::hours(24));
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let mut config = valid_config();
        config.tokens.access_ttl_minutes = 200_000_000_000_000;

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref var, .. } if var == "ACCESS_TOKEN_TTL_MINUTES")
        );

        let mut config = valid_config();
        config.tokens.refresh_ttl_hours = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref var, .. } if var == "REFRESH_TOKEN_TTL_HOURS")
        );

        // Above the cap but representable
        config.tokens.refresh_ttl_hours = 24 * 3651;
        assert!(config.tokens.refresh_ttl().is_err());
    }
}
