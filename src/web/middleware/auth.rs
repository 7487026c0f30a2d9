//! Session tokens and authentication extractors.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{require_confirmed, Principal};
use crate::db::{User, UserRepository};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Scope claim marking a session token.
pub const SESSION_SCOPE: &str = "session";

/// Session JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Always [`SESSION_SCOPE`].
    pub scope: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Keys for issuing and verifying session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl SessionKeys {
    /// Create session keys from the application secret.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Session lifetime in seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Issue a session token for a user.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id,
            scope: SESSION_SCOPE.to_string(),
            iat: now,
            exp: now + i64::try_from(self.expiry_secs).unwrap_or(i64::MAX / 2),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Verify a session token.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if data.claims.scope == SESSION_SCOPE => Some(data.claims),
            Ok(_) => {
                debug!("Rejected token without session scope");
                None
            }
            Err(e) => {
                debug!("JWT validation failed: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn load_principal(parts: &Parts, state: &AppState) -> Result<Principal, ApiError> {
    let Some(claims) = bearer_token(parts).and_then(|t| state.sessions.verify(t)) else {
        return Ok(Principal::Anonymous);
    };

    let mut conn = state.db.acquire().await?;
    let user = UserRepository::new(&mut conn).get_by_id(claims.sub).await?;

    Ok(match user {
        Some(user) => Principal::Authenticated(user),
        None => Principal::Anonymous,
    })
}

/// The acting principal; anonymous when no valid session is presented.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(load_principal(parts, state).await?))
    }
}

/// Extractor for logged-in users, confirmed or not.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match load_principal(parts, state).await? {
            Principal::Authenticated(user) => Ok(AuthUser(user)),
            Principal::Anonymous => Err(ApiError::unauthorized("Login required")),
        }
    }
}

/// Extractor for logged-in users who confirmed their email address.
#[derive(Debug, Clone)]
pub struct ConfirmedUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ConfirmedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = load_principal(parts, state).await?;
        let user = require_confirmed(&principal)?.clone();
        Ok(ConfirmedUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    fn user() -> User {
        User::stub(7, "john", None::<Role>, true)
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("test-secret", 3600);
        let token = keys.issue(&user()).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.scope, SESSION_SCOPE);
        assert_eq!(keys.expiry_secs(), 3600);
    }

    #[test]
    fn test_wrong_secret() {
        let token = SessionKeys::new("other", 3600).issue(&user()).unwrap();
        assert!(SessionKeys::new("test-secret", 3600).verify(&token).is_none());
    }

    #[test]
    fn test_expired_session() {
        let keys = SessionKeys::new("test-secret", 3600);
        let claims = SessionClaims {
            sub: 7,
            scope: SESSION_SCOPE.to_string(),
            iat: 1_000,
            exp: 2_000,
            jti: "x".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn test_action_token_is_not_a_session() {
        let codec = crate::auth::TokenCodec::new("test-secret", 900);
        let token = codec
            .issue(crate::auth::TokenPurpose::Confirm, 7, None, None)
            .unwrap();
        assert!(SessionKeys::new("test-secret", 3600).verify(&token).is_none());
    }

    #[test]
    fn test_wrong_scope() {
        let claims = SessionClaims {
            sub: 7,
            scope: "api".to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: chrono::Utc::now().timestamp() + 60,
            jti: "x".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(SessionKeys::new("test-secret", 3600).verify(&token).is_none());
    }
}
