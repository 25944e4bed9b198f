/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt embedded in the output. `verify`
/// compares in constant time inside the bcrypt crate.

use std::sync::Arc;

use crate::error::AuthError;
use crate::validators::MAX_PASSWORD_BYTES;

/// Input for the dummy hash Login verifies against when the username is
/// unknown. Never matches a real login: bcrypt compares the full digest.
const DUMMY_PASSWORD: &str = "fintrack-dummy-password";

/// One-way salted password hashing with a fixed, configured cost
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    /// Build a hasher for `cost`, precomputing the dummy hash at that cost.
    ///
    /// Stored hashes keep the cost they were created with. After the
    /// configured cost changes, logins for older accounts take a different
    /// time than unknown-user logins until those accounts are rehashed.
    ///
    /// # Errors
    /// Returns `HashingError` if the cost is out of range or bcrypt fails
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, cost)
            .map_err(|e| AuthError::HashingError(format!("Dummy hash failed: {}", e)))?;

        Ok(Self {
            cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password
    ///
    /// # Errors
    /// Returns `HashingError` if salt generation or bcrypt fails
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::HashingError(
                "Password exceeds the hashable length".to_string(),
            ));
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::HashingError(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash.
    ///
    /// A stored hash bcrypt cannot parse never verifies. Neither does a
    /// password bcrypt would truncate; it still costs one verification.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            let _ = bcrypt::verify(DUMMY_PASSWORD, &self.dummy_hash);
            return false;
        }
        match bcrypt::verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }

    /// Spend one full verification for a username that does not exist.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }
}
