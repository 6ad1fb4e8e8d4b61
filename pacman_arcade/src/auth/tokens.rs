//! JWT issuing and verification.
//!
//! Signing is plain HS256 through `jsonwebtoken`. Revocation is not checked
//! here; that is the [`TokenBlacklist`](crate::db::TokenBlacklist)'s job and
//! is wired up by [`AuthManager`](super::AuthManager).

use super::{
    errors::TokenError,
    models::{AccessClaims, Player, RefreshClaims, TokenPair, TokenType},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::minutes(60);

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(1);

/// Issues and verifies signed access/refresh tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_lifetimes(secret, DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL)
    }

    pub fn with_lifetimes(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a fresh refresh token and an access token bound to it
    pub fn issue_pair(&self, player: &Player) -> Result<(TokenPair, RefreshClaims), TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: player.id,
            username: player.username.clone(),
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4(),
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
        };

        let refresh = self.sign(&claims)?;
        let access = self.issue_access(&claims)?;

        Ok((TokenPair { refresh, access }, claims))
    }

    /// Mint a new access token from verified refresh claims
    ///
    /// The access token never outlives its refresh token, so the blacklist
    /// entry written at logout covers every access token minted from it.
    pub fn issue_access(&self, refresh: &RefreshClaims) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = (now + self.access_ttl).timestamp().min(refresh.exp);
        let claims = AccessClaims {
            sub: refresh.sub,
            username: refresh.username.clone(),
            token_type: TokenType::Access,
            jti: Uuid::new_v4(),
            sid: refresh.jti,
            exp,
            iat: now.timestamp(),
        };

        self.sign(&claims)
    }

    /// Check signature, expiry and type of an access token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, TokenType::Access)
    }

    /// Check signature, expiry and type of a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token, TokenType::Refresh)
    }

    fn sign<T: serde::Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, expected: TokenType) -> Result<T, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)?;

        let token_type: TokenType = data
            .claims
            .get("token_type")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or(TokenError::Malformed)?;
        if token_type != expected {
            return Err(TokenError::WrongType);
        }

        serde_json::from_value(data.claims).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player {
            id: 7,
            username: "inky".to_string(),
            email: "inky@example.com".to_string(),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let service = TokenService::new("unit_test_secret_that_is_long_enough");
        let (pair, refresh_claims) = service.issue_pair(&player()).unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        assert_eq!(access.sub, 7);
        assert_eq!(access.username, "inky");
        assert_eq!(access.sid, refresh_claims.jti);

        let refresh = service.verify_refresh(&pair.refresh).unwrap();
        assert_eq!(refresh.jti, refresh_claims.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_access_token_never_outlives_refresh_token() {
        let service = TokenService::with_lifetimes(
            "unit_test_secret_that_is_long_enough",
            Duration::hours(2),
            Duration::minutes(10),
        );
        let (pair, refresh_claims) = service.issue_pair(&player()).unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        assert_eq!(access.exp, refresh_claims.exp);

        // A refresh token close to expiry mints a correspondingly short access token
        let nearly_expired = RefreshClaims {
            exp: Utc::now().timestamp() + 5,
            ..refresh_claims
        };
        let minted = service.issue_access(&nearly_expired).unwrap();
        let access = service.verify_access(&minted).unwrap();
        assert_eq!(access.exp, nearly_expired.exp);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = TokenService::new("unit_test_secret_that_is_long_enough");
        let (pair, _) = service.issue_pair(&player()).unwrap();

        assert!(matches!(
            service.verify_access(&pair.refresh),
            Err(TokenError::WrongType)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.access),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = TokenService::with_lifetimes(
            "unit_test_secret_that_is_long_enough",
            Duration::seconds(-30),
            Duration::seconds(-30),
        );
        let (pair, _) = service.issue_pair(&player()).unwrap();

        assert!(matches!(
            service.verify_access(&pair.access),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.refresh),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_garbage_and_foreign_signatures_are_malformed() {
        let service = TokenService::new("unit_test_secret_that_is_long_enough");
        let other = TokenService::new("a_completely_different_secret_value");
        let (pair, _) = other.issue_pair(&player()).unwrap();

        assert!(matches!(
            service.verify_refresh("not.a.jwt"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.refresh),
            Err(TokenError::Malformed)
        ));
    }
}
