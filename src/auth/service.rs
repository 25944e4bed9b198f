/// Registration and Login
///
/// Orchestrates the credential store, the password hasher and the token
/// issuer. Hashing runs on the blocking pool so slow bcrypt rounds never
/// stall an HTTP worker.

use std::fmt;
use std::sync::Arc;

use crate::auth::claims::SessionToken;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordHasher;
use crate::error::{AuthError, DatabaseError};
use crate::store::{CredentialStore, Identity};
use crate::telemetry::spawn_blocking_with_tracing;
use crate::validators::{normalize_email, validate_password, validate_username};

/// Username and plaintext password, alive only for one call
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher, issuer: TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            issuer,
        }
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.issuer.ttl_seconds()
    }

    /// Register a new identity.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty or malformed username, password or email
    /// - `UsernameTaken` if the username exists (the stored identity is kept)
    /// - `HashingError` / `StorageError` on infrastructure failure
    #[tracing::instrument(name = "register", skip(self, credentials, email), fields(username = %credentials.username))]
    pub async fn register(
        &self,
        credentials: Credentials,
        email: Option<&str>,
    ) -> Result<(), AuthError> {
        validate_username(&credentials.username)?;
        validate_password(&credentials.password)?;
        let email = normalize_email(email)?;

        let Credentials { username, password } = credentials;
        let hasher = self.hasher.clone();
        let password_hash = spawn_blocking_with_tracing(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::HashingError(format!("Hashing task failed: {}", e)))??;

        let identity = Identity {
            username,
            password_hash,
            email,
        };

        self.store.insert(&identity).await.map_err(|e| match e {
            DatabaseError::UniqueConstraintViolation(_) => AuthError::UsernameTaken,
            other => AuthError::StorageError(other.to_string()),
        })?;

        tracing::info!("Identity registered");
        Ok(())
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown usernames and wrong passwords both cost one bcrypt
    /// verification and both return `InvalidCredentials`.
    #[tracing::instrument(name = "login", skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> Result<SessionToken, AuthError> {
        let stored_hash = match self.store.find_by_username(&credentials.username).await {
            Ok(identity) => Some(identity.password_hash),
            Err(DatabaseError::NotFound(_)) => None,
            Err(e) => return Err(AuthError::StorageError(e.to_string())),
        };

        let Credentials { username, password } = credentials;
        let hasher = self.hasher.clone();
        let verified = spawn_blocking_with_tracing(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AuthError::HashingError(format!("Verification task failed: {}", e)))?;

        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&username)?;
        tracing::info!("Session token issued");
        Ok(token)
    }
}
