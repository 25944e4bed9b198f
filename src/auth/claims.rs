/// Session token payload
///
/// The signed claims of a session token plus the issued token itself.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claims signed into every session token (RFC 7519 names)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Claims for `subject` issued at `now`, valid for `ttl_seconds`.
    ///
    /// # Errors
    /// `HashingError` if the expiry does not fit in a timestamp
    pub fn new(
        subject: &str,
        now: DateTime<Utc>,
        ttl_seconds: i64,
        issuer: &str,
    ) -> Result<Self, AuthError> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(ttl_seconds)
            .filter(|exp| Utc.timestamp_opt(*exp, 0).single().is_some())
            .ok_or_else(|| {
                AuthError::HashingError(format!("Token lifetime of {}s overflows", ttl_seconds))
            })?;

        Ok(Self {
            sub: subject.to_string(),
            iat,
            exp,
            iss: issuer.to_string(),
        })
    }

    /// Expired once `now` reaches `exp`; there is no leeway.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// A freshly issued session token
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    token: String,
}

impl SessionToken {
    pub(crate) fn new(claims: &Claims, token: String) -> Self {
        Self {
            subject: claims.sub.clone(),
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
            token,
        }
    }

    /// Compact serialized form handed to the client
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_string(self) -> String {
        self.token
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_creation() {
        let now = Utc::now();
        let claims = Claims::new("alice", now, 3600, "test").unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let claims = Claims::new("alice", now, 60, "test").unwrap();

        assert!(!claims.is_expired_at(now + Duration::seconds(59)));
        assert!(claims.is_expired_at(now + Duration::seconds(60)));
        assert!(claims.is_expired_at(now + Duration::seconds(61)));
    }

    #[test]
    fn test_session_token_timestamps() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = Claims::new("alice", now, 86_400, "test").unwrap();
        let token = SessionToken::new(&claims, "a.b.c".to_string());

        assert_eq!(token.subject, "alice");
        assert_eq!(token.issued_at, now);
        assert_eq!(token.expires_at, now + Duration::hours(24));
        assert_eq!(token.as_str(), "a.b.c");
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let now = Utc::now();
        assert!(matches!(
            Claims::new("alice", now, i64::MAX, "test"),
            Err(AuthError::HashingError(_))
        ));
        assert!(Claims::new("alice", now, 365 * 24 * 60 * 60, "test").is_ok());
    }
}
