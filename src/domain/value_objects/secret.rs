//! One-way salted hash for shared secrets

use std::fmt;

use serde::{Deserialize, Serialize};

const COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
#[error("Failed to hash secret: {0}")]
pub struct SecretHashError(#[from] bcrypt::BcryptError);

/// Stored form of a shared secret: a bcrypt hash (`$2b$10$...`).
///
/// The plaintext is never kept. `Debug` redacts the value so the hash does
/// not end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    /// Hash a plaintext secret with a fresh random salt. CPU bound; callers
    /// on the runtime should move it to a blocking thread.
    pub fn generate(plain_text: &str) -> Result<Self, SecretHashError> {
        Ok(Self(bcrypt::hash(plain_text, COST)?))
    }

    /// Compare a presented plaintext against the stored hash.
    /// A malformed stored value never verifies.
    pub fn verify(&self, plain_text: &str) -> bool {
        bcrypt::verify(plain_text, &self.0).unwrap_or(false)
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(***)")
    }
}
