/// Session Token Issuance and Validation
///
/// Tokens are compact HS256 JWTs. The signing key is built once from
/// configuration and shared immutably by the issuer and the validator;
/// rotating it invalidates every outstanding token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, SessionToken};
use crate::configuration::JwtSettings;
use crate::error::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Process-wide signing key material
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Creates signed, time-bound session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<SessionKeys>,
    ttl_seconds: i64,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(keys: Arc<SessionKeys>, ttl_seconds: i64, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            ttl_seconds,
            issuer: issuer.into(),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<SessionToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let claims = Claims::new(subject, now, self.ttl_seconds, &self.issuer)?;

        let token = encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|e| AuthError::HashingError(format!("Token signing failed: {}", e)))?;

        Ok(SessionToken::new(&claims, token))
    }
}

/// Verifies presented tokens and extracts their subject
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<SessionKeys>,
    validation: Arc<Validation>,
}

impl TokenValidator {
    pub fn new(keys: Arc<SessionKeys>, issuer: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // Expiry is checked against our own clock after the signature.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            keys,
            validation: Arc::new(validation),
        }
    }

    /// Verify `token` against the current time and return its subject.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as if the current time were `now`.
    ///
    /// # Errors
    /// - `MalformedToken` when the token does not parse
    /// - `InvalidSignature` when it was tampered with or signed by another key
    /// - `TokenExpired` when `now` is at or past its expiry
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let error = classify(e.kind());
                tracing::debug!(reason = %e, "Session token rejected");
                error
            })?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims.sub)
    }
}

/// Build the issuer/validator pair from configuration.
pub fn session_tokens(config: &JwtSettings) -> (TokenIssuer, TokenValidator) {
    let keys = Arc::new(SessionKeys::from_secret(config.secret.as_bytes()));
    (
        TokenIssuer::new(keys.clone(), config.token_ttl_seconds, config.issuer.clone()),
        TokenValidator::new(keys, &config.issuer),
    )
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::MalformedToken,
    }
}
