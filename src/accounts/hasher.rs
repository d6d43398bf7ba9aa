//! Argon2id password hashing.
//!
//! Hashing and verification are CPU bound; the async helpers move the work to
//! the blocking pool so request tasks keep running.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};

const SALT_LEN: usize = 16;

#[derive(Clone, Debug)]
pub struct Hasher {
    params: Params,
}

impl Default for Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Hasher {
    /// Build a hasher with explicit Argon2id costs.
    ///
    /// # Errors
    /// Returns an error if the costs are outside the ranges Argon2 accepts.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the input.
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .context("failed to generate password salt")?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| anyhow!("failed to encode password salt: {e}"))?;
        let phc = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash password: {e}"))?;
        Ok(phc.to_string())
    }

    /// Check a password against a stored PHC string. Malformed hashes never
    /// verify.
    #[must_use]
    pub fn verify(&self, password: &str, phc: &str) -> bool {
        PasswordHash::new(phc)
            .is_ok_and(|parsed| self.argon2().verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// [`Hasher::hash`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash_blocking(&self, password: SecretString) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .context("password hashing task failed")?
    }

    /// [`Hasher::verify`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if the blocking task panics.
    pub async fn verify_blocking(&self, password: SecretString, phc: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &phc))
            .await
            .context("password verification task failed")
    }
}
