//! Password hashing
//!
//! Stored digests have the form `salt|hash` where `salt` is 16 random bytes and
//! `hash` is SHA-256 over `salt ‖ password`, both hex encoded.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RbacError, Result};

/// One-way password digest. Never holds plaintext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PasswordHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// A one-way hashing primitive with a matching verify.
pub trait PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash>;
    fn verify(&self, digest: &PasswordHash, candidate: &str) -> bool;
}

/// Salted SHA-256, the default hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct SaltedSha256;

impl PasswordHasher for SaltedSha256 {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash> {
        let salt = generate_salt()?;
        let hash = hash_password(&salt, plaintext);
        Ok(PasswordHash(format!("{}|{}", salt, hash)))
    }

    fn verify(&self, digest: &PasswordHash, candidate: &str) -> bool {
        let Some((salt, stored)) = digest.0.split_once('|') else {
            tracing::error!("malformed password digest");
            return false;
        };
        ct_eq(stored.as_bytes(), hash_password(salt, candidate).as_bytes())
    }
}

/// Generate random salt (16 bytes, hex encoded)
fn generate_salt() -> Result<String> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| RbacError::Hash(e.to_string()))?;
    Ok(hex::encode(bytes))
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

mod hex {
    pub fn encode(data: impl AsRef<[u8]>) -> String {
        data.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
