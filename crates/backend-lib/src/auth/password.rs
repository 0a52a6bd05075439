// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Hashes are scrypt PHC strings with a per-hash random salt. Hashing and
//! verification run on the blocking pool so a slow hash never stalls the
//! request loop, and both are bounded by the configured operation timeout.
use std::sync::Arc;
use std::time::Duration;

use scrypt::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher as _,
        PasswordVerifier as _, SaltString,
    },
    Params, Scrypt,
};
use zeroize::Zeroize;

use super::token_generator::generate_secure_token;
use crate::error::AppError;
use crate::timeout::bounded;

/// Default scrypt cost (`log_n`)
pub const DEFAULT_COST: u8 = 10;

/// Salted one-way password hashing with a fixed work factor
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
    timeout: Duration,
    /// Hash of a random secret with the same params, verified against when
    /// there is no stored hash so that both outcomes cost the same
    decoy: Arc<str>,
}

impl PasswordHasher {
    /// `cost` is the scrypt `log_n` parameter
    pub fn new(cost: u8, timeout: Duration) -> Result<Self, AppError> {
        let params = Params::new(cost, Params::RECOMMENDED_R, Params::RECOMMENDED_P, Params::RECOMMENDED_LEN)
            .map_err(|e| AppError::Internal(format!("invalid scrypt cost {cost}: {e}")))?;
        let decoy = hash_with(&generate_secure_token(), params)?;
        Ok(Self {
            params,
            timeout,
            decoy: decoy.into(),
        })
    }

    /// Hash a password. Two calls with the same input give different hashes.
    pub async fn hash(&self, plain: &str) -> Result<String, AppError> {
        let mut plain = plain.to_owned();
        let params = self.params;
        let task = tokio::task::spawn_blocking(move || {
            let hashed = hash_with(&plain, params);
            plain.zeroize();
            hashed
        });
        bounded(self.timeout, "hasher", async move { task.await? }).await
    }

    /// Check a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. A stored hash that cannot be parsed is an
    /// error, never a match.
    pub async fn verify(&self, plain: &str, hashed: &str) -> Result<bool, AppError> {
        let mut plain = plain.to_owned();
        let hashed = hashed.to_owned();
        let task = tokio::task::spawn_blocking(move || {
            let valid = verify_with(&plain, &hashed);
            plain.zeroize();
            valid
        });
        bounded(self.timeout, "hasher", async move { task.await? }).await
    }

    /// Spend a full verification on `plain` without a stored hash.
    ///
    /// Used for unknown usernames so the response time matches a wrong
    /// password. The result is always a mismatch.
    pub async fn verify_decoy(&self, plain: &str) -> Result<(), AppError> {
        let decoy = self.decoy.clone();
        self.verify(plain, &decoy).await.map(|_| ())
    }
}

fn hash_with(plain: &str, params: Params) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

fn verify_with(plain: &str, hashed: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hashed)
        .map_err(|e| AppError::Internal(format!("malformed password hash: {e}")))?;
    match Scrypt.verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("password verification failed: {e}"))),
    }
}
