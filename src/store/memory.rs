//! Process-local store for development and tests.
//!
//! Data is lost on restart and is not shared between instances.

use super::now_unix_seconds;
use crate::accounts::{Account, AccountStore, CreateOutcome, NewAccount, UniqueField};
use crate::sessions::{SessionRecord, SessionStore};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    sessions: HashMap<Vec<u8>, StoredSession>,
}

struct StoredSession {
    record: SessionRecord,
    expires_at_unix: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag of an account. Returns `false` if it does not exist.
    pub async fn set_active(&self, id: Uuid, active: bool) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.accounts.get_mut(&id) {
            Some(account) => {
                account.is_active = active;
                true
            }
            None => false,
        }
    }

    pub async fn account_count(&self) -> usize {
        self.inner.lock().await.accounts.len()
    }

    pub async fn session_count(&self) -> usize {
        let now = now_unix_seconds();
        self.inner
            .lock()
            .await
            .sessions
            .values()
            .filter(|session| session.expires_at_unix > now)
            .count()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.inner.lock().await.accounts.get(&id).cloned())
    }

    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.values().any(|account| match field {
            UniqueField::Email => account.email == value,
            UniqueField::Username => account.username == value,
        }))
    }

    async fn create(&self, new: &NewAccount) -> Result<CreateOutcome> {
        let mut inner = self.inner.lock().await;

        for account in inner.accounts.values() {
            if account.email == new.email {
                return Ok(CreateOutcome::Conflict(UniqueField::Email));
            }
            if account.username == new.username {
                return Ok(CreateOutcome::Conflict(UniqueField::Username));
            }
        }

        let account = Account {
            id: Uuid::now_v7(),
            email: new.email.clone(),
            username: new.username.clone(),
            display_name: new.display_name.clone(),
            password_hash: new.password_hash.clone(),
            is_active: true,
            date_joined_unix: now_unix_seconds(),
            last_login_unix: None,
        };
        inner.accounts.insert(account.id, account.clone());

        Ok(CreateOutcome::Created(account))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        if let Some(account) = self.inner.lock().await.accounts.get_mut(&id) {
            account.last_login_unix = Some(now_unix_seconds());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(
        &self,
        token_hash: &[u8],
        account_id: Uuid,
        ttl_seconds: i64,
    ) -> Result<()> {
        let now = now_unix_seconds();
        let mut inner = self.inner.lock().await;
        // Opportunistic cleanup keeps the map from growing without bound.
        inner
            .sessions
            .retain(|_, session| session.expires_at_unix > now);
        inner.sessions.insert(
            token_hash.to_vec(),
            StoredSession {
                record: SessionRecord {
                    account_id,
                    created_at_unix: now,
                },
                expires_at_unix: now.saturating_add(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>> {
        let now = now_unix_seconds();
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(token_hash)
            .filter(|session| session.expires_at_unix > now)
            .map(|session| session.record.clone()))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<()> {
        self.inner.lock().await.sessions.remove(token_hash);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_account(email: &str, username: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            username: username.to_string(),
            display_name: String::new(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn create_enforces_unique_email_and_username() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create(&new_account("a@b.com", "ab")).await.unwrap(),
            CreateOutcome::Created(_)
        ));
        assert!(matches!(
            store.create(&new_account("a@b.com", "other")).await.unwrap(),
            CreateOutcome::Conflict(UniqueField::Email)
        ));
        assert!(matches!(
            store.create(&new_account("c@d.com", "ab")).await.unwrap(),
            CreateOutcome::Conflict(UniqueField::Username)
        ));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn exists_checks_each_field() {
        let store = MemoryStore::new();
        store.create(&new_account("a@b.com", "ab")).await.unwrap();
        assert!(store.exists(UniqueField::Email, "a@b.com").await.unwrap());
        assert!(store.exists(UniqueField::Username, "ab").await.unwrap());
        assert!(!store.exists(UniqueField::Username, "AB").await.unwrap());
    }

    #[tokio::test]
    async fn expired_sessions_are_not_returned() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        store.insert_session(b"live", id, 60).await.unwrap();
        store.insert_session(b"dead", id, -1).await.unwrap();

        assert_eq!(
            store.lookup_session(b"live").await.unwrap().map(|r| r.account_id),
            Some(id)
        );
        assert!(store.lookup_session(b"dead").await.unwrap().is_none());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn delete_missing_session_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete_session(b"missing").await.is_ok());
    }

    #[tokio::test]
    async fn set_active_toggles_flag() {
        let store = MemoryStore::new();
        let CreateOutcome::Created(account) = store.create(&new_account("a@b.com", "ab")).await.unwrap()
        else {
            panic!("expected account to be created");
        };
        assert!(store.set_active(account.id, false).await);
        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(!store.set_active(Uuid::now_v7(), false).await);
    }
}
