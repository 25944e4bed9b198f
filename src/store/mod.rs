/// Persistence module
///
/// Store traits consumed by the auth core and the finance routes, with a
/// Postgres implementation for production and an in-memory one for tests
/// and local runs.

mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::finance::FinanceEntry;

pub use memory::{InMemoryCredentialStore, InMemoryFinanceStore};
pub use postgres::{PgCredentialStore, PgFinanceStore};

/// A registered user's durable record
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// User records keyed by unique username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new identity.
    ///
    /// # Errors
    /// `UniqueConstraintViolation` if the username exists; the stored
    /// identity is left untouched.
    async fn insert(&self, identity: &Identity) -> Result<(), DatabaseError>;

    /// # Errors
    /// `NotFound` if no identity has this username
    async fn find_by_username(&self, username: &str) -> Result<Identity, DatabaseError>;
}

/// Append-only finance records
#[async_trait]
pub trait FinanceStore: Send + Sync {
    async fn insert(&self, entry: &FinanceEntry) -> Result<(), DatabaseError>;
}
