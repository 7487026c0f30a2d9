//! Signed, time-limited action tokens.
//!
//! Tokens are HS256 JWTs carrying a purpose, a subject user ID and an
//! optional payload (the pending address for an email change). They are
//! not persisted; possession of an unexpired token is the proof.

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// What a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Confirm the account's email address.
    Confirm,
    /// Reset a forgotten password.
    Reset,
    /// Move the account to a new email address.
    ChangeEmail,
}

impl TokenPurpose {
    /// Wire name of the purpose.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Confirm => "confirm",
            TokenPurpose::Reset => "reset",
            TokenPurpose::ChangeEmail => "change_email",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token redemption and issuing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a token, or its claims could not be decoded.
    #[error("malformed token")]
    Malformed,

    /// The signature does not match the content.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// The token is past its expiry time.
    #[error("token has expired")]
    Expired,

    /// The token was issued for another action.
    #[error("token purpose mismatch: expected {expected}, found {found}")]
    PurposeMismatch {
        /// Purpose the caller asked for.
        expected: TokenPurpose,
        /// Purpose carried by the token.
        found: TokenPurpose,
    },

    /// Signing failed.
    #[error("token encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct ActionClaims {
    purpose: TokenPurpose,
    sub: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    iat: i64,
    exp: i64,
    jti: String,
}

/// The verified content of a redeemed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemed {
    /// ID of the user the token was issued for.
    pub subject_id: i64,
    /// Optional payload.
    pub payload: Option<String>,
}

/// Issues and redeems action tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: u64,
}

impl TokenCodec {
    /// Create a codec from the application secret.
    pub fn new(secret: &str, default_ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `redeem_at`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl: default_ttl_secs,
        }
    }

    /// Default lifetime in seconds.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Issue a token valid from now.
    pub fn issue(
        &self,
        purpose: TokenPurpose,
        subject_id: i64,
        payload: Option<&str>,
        ttl_secs: Option<u64>,
    ) -> Result<String, TokenError> {
        self.issue_at(purpose, subject_id, payload, ttl_secs, now())
    }

    /// Issue a token as if the clock read `now` (seconds since epoch).
    pub fn issue_at(
        &self,
        purpose: TokenPurpose,
        subject_id: i64,
        payload: Option<&str>,
        ttl_secs: Option<u64>,
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl = ttl_secs.unwrap_or(self.default_ttl);
        let claims = ActionClaims {
            purpose,
            sub: subject_id,
            payload: payload.map(str::to_string),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX)),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Redeem a token for the expected purpose.
    pub fn redeem(&self, token: &str, expected: TokenPurpose) -> Result<Redeemed, TokenError> {
        self.redeem_at(token, expected, now())
    }

    /// Redeem a token as if the clock read `now`.
    ///
    /// Checks run in order: signature, expiry, purpose. The token stays
    /// valid up to and including its `exp` second.
    pub fn redeem_at(
        &self,
        token: &str,
        expected: TokenPurpose,
        now: i64,
    ) -> Result<Redeemed, TokenError> {
        let data = decode::<ActionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!(error = %e, "Token rejected");
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    _ => TokenError::Malformed,
                }
            },
        )?;
        let claims = data.claims;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        if claims.purpose != expected {
            return Err(TokenError::PurposeMismatch {
                expected,
                found: claims.purpose,
            });
        }

        Ok(Redeemed {
            subject_id: claims.sub,
            payload: claims.payload,
        })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
