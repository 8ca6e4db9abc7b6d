//! Postgres-backed credential store and refresh-token registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::CredentialStore;
use crate::auth::AuthError;
use crate::auth::registry::RefreshTokenRegistry;
use crate::auth::roles::Role;
use crate::models::account::{Account, NewAccount};
use crate::uuid::uuidv7;

type AccountRow = (
    String,
    String,
    String,
    String,
    String,
    bool,
    DateTime<Utc>,
);

const ACCOUNT_COLUMNS: &str =
    "id::text, email, username, password_hash, role::text, is_active, created_at";

fn account_from_row(row: AccountRow) -> Result<Account, AuthError> {
    let (id, email, username, password_hash, role, is_active, created_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| AuthError::Internal(format!("account {id}: {e}")))?;
    Ok(Account {
        id,
        email,
        username,
        password_hash,
        role,
        is_active,
        created_at,
    })
}

/// Credential store over the `accounts` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 OR username = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        row.map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1::uuid"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(account_from_row).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts (email, username, password_hash, role) \
             VALUES ($1, $2, $3, $4::account_role) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        account_from_row(row)
    }

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1::uuid")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE accounts SET is_active = $2 WHERE id = $1::uuid")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}

/// Registry over the `refresh_tokens` table, for deployments that need the
/// registry to survive restarts or span processes. Row-level updates give
/// the per-account atomicity the contract asks for.
#[derive(Clone)]
pub struct PgRefreshTokenRegistry {
    pool: PgPool,
}

impl PgRefreshTokenRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRegistry for PgRefreshTokenRegistry {
    async fn store(
        &self,
        account_id: &str,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, token_hash, account_id, expires_at) \
             VALUES ($1, $2, $3::uuid, $4)",
        )
        .bind(uuidv7())
        .bind(fingerprint)
        .bind(account_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_valid(&self, fingerprint: &str) -> Result<bool, AuthError> {
        // Lazy cleanup: an expired row found here is deleted in the same
        // statement, mirroring the in-memory behavior.
        let expired = sqlx::query(
            "DELETE FROM refresh_tokens WHERE token_hash = $1 AND expires_at <= now()",
        )
        .bind(fingerprint)
        .execute(&self.pool)
        .await?;
        if expired.rows_affected() > 0 {
            return Ok(false);
        }
        let valid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(\
                SELECT 1 FROM refresh_tokens \
                WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > now())",
        )
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await?;
        Ok(valid)
    }

    async fn remove(&self, fingerprint: &str) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now() \
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(fingerprint)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_all_for_account(&self, account_id: &str) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now() \
             WHERE account_id = $1::uuid AND revoked_at IS NULL",
        )
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
