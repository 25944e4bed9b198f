use async_trait::async_trait;
use sqlx::PgPool;

use super::{CredentialStore, FinanceStore, Identity};
use crate::error::DatabaseError;
use crate::finance::FinanceEntry;

/// `users` table; the unique index on `username` serialises registrations
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, identity: &Identity) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email, created_at)
            VALUES ($1, $2, $3, now())
            "#,
        )
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(&identity.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, DatabaseError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT username, password_hash, email FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((username, password_hash, email)) => Ok(Identity {
                username,
                password_hash,
                email,
            }),
            None => Err(DatabaseError::NotFound("user".to_string())),
        }
    }
}

/// `finances` table, keyed to `users(username)`
#[derive(Clone)]
pub struct PgFinanceStore {
    pool: PgPool,
}

impl PgFinanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FinanceStore for PgFinanceStore {
    async fn insert(&self, entry: &FinanceEntry) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO finances (username, kind, source, amount, date, description)
            VALUES ($1, $2, $3, $4::numeric, COALESCE($5, now()), $6)
            "#,
        )
        .bind(&entry.username)
        .bind(entry.kind.as_str())
        .bind(&entry.source)
        .bind(&entry.amount)
        .bind(entry.date)
        .bind(&entry.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
