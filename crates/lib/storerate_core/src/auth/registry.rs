//! Refresh-token registry.
//!
//! Tracks live refresh tokens per account so they can be revoked before
//! their cryptographic expiry. Verification of the token itself stays in
//! [`super::token`]; the registry only answers "is this one still allowed".
//!
//! Callers pass SHA-256 fingerprints (see [`token_fingerprint`]), never raw
//! tokens, so no storage backend ever holds a usable credential.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::AuthError;

/// SHA-256 fingerprint of a token, hex-encoded, for registry storage.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Revocation-tracking store for refresh tokens.
///
/// An account may hold several concurrently valid tokens (multi-device).
/// Implementations must make each mutation atomic with respect to the
/// others: two concurrent rotations for one account may not corrupt its
/// token set.
#[async_trait]
pub trait RefreshTokenRegistry: Send + Sync {
    /// Record a token fingerprint under its owning account.
    async fn store(
        &self,
        account_id: &str,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// True only if the fingerprint is present and not expired. A present
    /// but expired entry is removed as a side effect (lazy cleanup).
    async fn is_valid(&self, fingerprint: &str) -> Result<bool, AuthError>;

    /// Invalidate one token. Idempotent.
    async fn remove(&self, fingerprint: &str) -> Result<(), AuthError>;

    /// Invalidate every token for one account ("log out everywhere").
    async fn remove_all_for_account(&self, account_id: &str) -> Result<(), AuthError>;

    /// Remove every expired entry, returning how many were dropped. Runs on
    /// a timer through the same mutation path as request-driven removal.
    async fn sweep_expired(&self) -> Result<u64, AuthError>;
}

#[derive(Default)]
struct Inner {
    /// fingerprint → (account id, expiry).
    by_token: HashMap<String, (String, DateTime<Utc>)>,
    /// account id → fingerprints, for O(tokens-per-account) revocation.
    by_account: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn drop_token(&mut self, fingerprint: &str) {
        if let Some((account_id, _)) = self.by_token.remove(fingerprint)
            && let Some(set) = self.by_account.get_mut(&account_id)
        {
            set.remove(fingerprint);
            if set.is_empty() {
                self.by_account.remove(&account_id);
            }
        }
    }
}

/// Process-local registry: one mutex over both maps, so every mutation
/// (including lazy cleanup inside `is_valid`) is atomic. Sufficient for a
/// single-process deployment; [`crate::store::postgres::PgRefreshTokenRegistry`]
/// backs the same contract with shared storage.
#[derive(Default)]
pub struct InMemoryRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRegistry for InMemoryRegistry {
    async fn store(
        &self,
        account_id: &str,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("registry lock poisoned".to_string()))?;
        inner.by_token.insert(
            fingerprint.to_string(),
            (account_id.to_string(), expires_at),
        );
        inner
            .by_account
            .entry(account_id.to_string())
            .or_default()
            .insert(fingerprint.to_string());
        Ok(())
    }

    async fn is_valid(&self, fingerprint: &str) -> Result<bool, AuthError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("registry lock poisoned".to_string()))?;
        match inner.by_token.get(fingerprint) {
            None => Ok(false),
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                inner.drop_token(fingerprint);
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    async fn remove(&self, fingerprint: &str) -> Result<(), AuthError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("registry lock poisoned".to_string()))?;
        inner.drop_token(fingerprint);
        Ok(())
    }

    async fn remove_all_for_account(&self, account_id: &str) -> Result<(), AuthError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("registry lock poisoned".to_string()))?;
        if let Some(set) = inner.by_account.remove(account_id) {
            for fingerprint in set {
                inner.by_token.remove(&fingerprint);
            }
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("registry lock poisoned".to_string()))?;
        let now = Utc::now();
        let expired: Vec<String> = inner
            .by_token
            .iter()
            .filter(|(_, (_, expires_at))| *expires_at <= now)
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect();
        let count = expired.len() as u64;
        for fingerprint in &expired {
            inner.drop_token(fingerprint);
        }
        Ok(count)
    }
}

/// Spawn the periodic expiry sweep. Runs until the token is cancelled.
pub fn spawn_sweeper(
    registry: Arc<dyn RefreshTokenRegistry>,
    period: std::time::Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // First tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => match registry.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "swept expired refresh tokens"),
                    Err(e) => warn!(error = %e, "refresh token sweep failed"),
                },
            }
        }
    })
}
