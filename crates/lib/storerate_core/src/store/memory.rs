//! In-memory credential store, for tests and single-process demos.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::CredentialStore;
use crate::auth::AuthError;
use crate::models::account::{Account, NewAccount};
use crate::uuid::uuidv7;

/// `Mutex<HashMap>`-backed store with the same uniqueness rules the
/// Postgres schema enforces.
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built account directly (test seeding).
    pub fn seed(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(account.id.clone(), account);
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts
            .lock()
            .map_err(|_| AuthError::Internal("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AuthError> {
        let accounts = self.lock()?;
        Ok(accounts
            .values()
            .find(|a| a.email == identifier || a.username == identifier)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.lock()?.values().any(|a| a.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.lock()?.values().any(|a| a.username == username))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let mut accounts = self.lock()?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::AlreadyExists("email".to_string()));
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(AuthError::AlreadyExists("username".to_string()));
        }
        let created = Account {
            id: uuidv7().to_string(),
            email: account.email,
            username: account.username,
            password_hash: account.password_hash,
            role: account.role,
            is_active: true,
            created_at: Utc::now(),
        };
        accounts.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), AuthError> {
        let mut accounts = self.lock()?;
        let account = accounts.get_mut(id).ok_or(AuthError::NotFound)?;
        account.password_hash = hash.to_string();
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<(), AuthError> {
        let mut accounts = self.lock()?;
        let account = accounts.get_mut(id).ok_or(AuthError::NotFound)?;
        account.is_active = active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;

    fn new_account(email: &str, username: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "$2b$04$fakefakefakefakefakefak".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_either_identifier() {
        let store = MemoryCredentialStore::new();
        let created = store.create(new_account("a@x.com", "alice")).await.unwrap();

        let by_email = store.find_by_login("a@x.com").await.unwrap().unwrap();
        let by_username = store.find_by_login("alice").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_username.id, created.id);
        assert!(by_email.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_and_username_rejected() {
        let store = MemoryCredentialStore::new();
        store.create(new_account("a@x.com", "alice")).await.unwrap();

        let err = store
            .create(new_account("a@x.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(ref f) if f == "email"));

        let err = store
            .create(new_account("b@x.com", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(ref f) if f == "username"));
    }

    #[tokio::test]
    async fn identifiers_compare_literally() {
        let store = MemoryCredentialStore::new();
        store.create(new_account("a@x.com", "alice")).await.unwrap();
        assert!(store.find_by_login("A@X.COM").await.unwrap().is_none());
        assert!(!store.email_exists("A@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn set_active_flips_flag_and_errors_on_unknown() {
        let store = MemoryCredentialStore::new();
        let created = store.create(new_account("a@x.com", "alice")).await.unwrap();

        store.set_active(&created.id, false).await.unwrap();
        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert!(!found.is_active);

        let err = store.set_active("missing", false).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn update_password_hash_replaces_hash() {
        let store = MemoryCredentialStore::new();
        let created = store.create(new_account("a@x.com", "alice")).await.unwrap();
        store
            .update_password_hash(&created.id, "$2b$04$newhash")
            .await
            .unwrap();
        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "$2b$04$newhash");
    }
}
