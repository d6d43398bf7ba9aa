//! Account model, persistence contract and credential checks.

mod authenticate;
mod hasher;

pub use authenticate::authenticate;
pub use hasher::Hasher;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// A persisted account.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined_unix: i64,
    pub last_login_unix: Option<i64>,
}

impl Account {
    /// Name to greet the account with: the display name, or the username when
    /// no display name was given.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.to_string(),
            email: self.email.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("password_hash", &"***")
            .field("is_active", &self.is_active)
            .field("date_joined_unix", &self.date_joined_unix)
            .field("last_login_unix", &self.last_login_unix)
            .finish()
    }
}

/// An account that passed validation but has not been stored yet.
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Public view of an account, safe to render.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
}

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
        }
    }
}

/// Outcome when inserting a new account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Account),
    Conflict(UniqueField),
}

/// Persistence for accounts. Uniqueness of email and username is enforced by
/// the store itself; callers only pre-check to report friendly errors.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by its normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool>;

    async fn create(&self, account: &NewAccount) -> Result<CreateOutcome>;

    /// Record a successful login.
    async fn touch_last_login(&self, id: Uuid) -> Result<()>;

    /// Cheap liveness check used by `/health`.
    async fn ping(&self) -> Result<()>;
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(display_name: &str) -> Account {
        Account {
            id: Uuid::now_v7(),
            email: "ab@example.com".to_string(),
            username: "ab".to_string(),
            display_name: display_name.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            is_active: true,
            date_joined_unix: 0,
            last_login_unix: None,
        }
    }

    #[test]
    fn greeting_name_prefers_display_name() {
        assert_eq!(account("Alice B.").greeting_name(), "Alice B.");
    }

    #[test]
    fn greeting_name_falls_back_to_username() {
        assert_eq!(account("").greeting_name(), "ab");
        assert_eq!(account("   ").greeting_name(), "ab");
    }

    #[test]
    fn debug_redacts_password_hash() {
        let rendered = format!("{:?}", account("Alice"));
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("argon2id"));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }
}
