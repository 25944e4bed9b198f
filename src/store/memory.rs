use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, FinanceStore, Identity};
use crate::error::DatabaseError;
use crate::finance::FinanceEntry;

/// Process-local credential store. The write lock makes the uniqueness
/// check and the insert one step.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, identity: &Identity) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.contains_key(&identity.username) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_username_key".to_string(),
            ));
        }
        users.insert(identity.username.clone(), identity.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Identity, DatabaseError> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryFinanceStore {
    entries: RwLock<Vec<FinanceEntry>>,
}

impl InMemoryFinanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far, in insertion order.
    pub async fn entries(&self) -> Vec<FinanceEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl FinanceStore for InMemoryFinanceStore {
    async fn insert(&self, entry: &FinanceEntry) -> Result<(), DatabaseError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }
}
