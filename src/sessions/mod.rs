//! Server-side sessions bound to an account.
//!
//! A session is a random token handed to the client in an `HttpOnly` cookie
//! (or presented as a bearer token). The store only ever sees the SHA-256 hash
//! of the token.

mod cookie;

pub(crate) use cookie::cookie_value;
pub use cookie::{SESSION_COOKIE_NAME, clear_session_cookie, extract_session_token, session_cookie};

use crate::accounts::{Account, AccountStore};
use crate::api::AuthConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Minimal data returned for a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub account_id: Uuid,
    pub created_at_unix: i64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        token_hash: &[u8],
        account_id: Uuid,
        ttl_seconds: i64,
    ) -> Result<()>;

    /// Look up an unexpired session.
    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>>;

    /// Delete a session. Deleting a missing session is not an error.
    async fn delete_session(&self, token_hash: &[u8]) -> Result<()>;
}

/// Create a new session token for the auth cookie.
/// The raw value is only returned to set the cookie; the store keeps a hash.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session token so raw values never reach the store.
#[must_use]
pub fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Bind a new session to `account` and return the cookie to set.
///
/// Any session presented with the request is discarded first so a token
/// known before login never becomes authenticated.
///
/// # Errors
/// Returns an error if the store fails or the cookie cannot be encoded.
#[instrument(skip(sessions, accounts, config, headers, account), fields(account_id = %account.id))]
pub async fn establish(
    sessions: &dyn SessionStore,
    accounts: &dyn AccountStore,
    config: &AuthConfig,
    headers: &HeaderMap,
    account: &Account,
) -> Result<HeaderValue> {
    if let Some(previous) = extract_session_token(headers) {
        sessions
            .delete_session(&hash_session_token(&previous))
            .await
            .context("failed to rotate previous session")?;
    }

    let token = generate_session_token()?;
    sessions
        .insert_session(
            &hash_session_token(&token),
            account.id,
            config.session_ttl_seconds(),
        )
        .await
        .context("failed to store session")?;

    accounts
        .touch_last_login(account.id)
        .await
        .context("failed to record last login")?;

    debug!("session established");

    session_cookie(config, &token).context("failed to build session cookie")
}

/// Drop the presented session, if any, and return a clearing cookie.
///
/// # Errors
/// Returns an error if the store cannot delete the session, since the token
/// would otherwise stay valid server-side, or if the clearing cookie cannot be
/// encoded.
#[instrument(skip_all)]
pub async fn teardown(
    sessions: &dyn SessionStore,
    config: &AuthConfig,
    headers: &HeaderMap,
) -> Result<HeaderValue> {
    if let Some(token) = extract_session_token(headers) {
        sessions
            .delete_session(&hash_session_token(&token))
            .await
            .context("failed to delete session")?;
    }

    clear_session_cookie(config).context("failed to build clearing cookie")
}

/// Resolve the presented session into a live, active account.
///
/// # Errors
/// Returns an error if a store lookup fails.
pub async fn resolve(
    sessions: &dyn SessionStore,
    accounts: &dyn AccountStore,
    headers: &HeaderMap,
) -> Result<Option<Account>> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };

    let Some(record) = sessions.lookup_session(&hash_session_token(&token)).await? else {
        return Ok(None);
    };

    Ok(accounts
        .find_by_id(record.account_id)
        .await?
        .filter(|account| account.is_active))
}
