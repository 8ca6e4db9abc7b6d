//! JWT token issue and verification (HS256).
//!
//! Access and refresh tokens share one claims shape but are signed with
//! distinct secrets, so neither can stand in for the other. Verification
//! is pure: revocation is the registry's concern, not this module's.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use super::roles::Role;
use crate::models::account::Claims;

/// Default access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token verification failures.
///
/// `Expired` means the signature was valid but the expiry has passed, so
/// clients may attempt a silent refresh. Everything else collapses to
/// `Invalid`: wrong signature, wrong secret, malformed, wrong issuer or
/// audience — all of those mean "log in again".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidToken,
        }
    }
}

/// Signing configuration, validated by [`TokenService::new`].
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
    pub audience: String,
}

#[derive(Clone, Copy)]
enum TokenKind {
    Access,
    Refresh,
}

/// Issues and verifies signed access/refresh tokens.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    audience: String,
    validation: Validation,
}

impl TokenService {
    /// Build the service, enforcing the startup preconditions: both secrets
    /// configured, non-empty, and mutually distinct. Identical secrets would
    /// let a refresh token pass as an access token.
    pub fn new(config: TokenConfig) -> Result<Self, AuthError> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(AuthError::Internal(
                "token signing secrets must be non-empty".to_string(),
            ));
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::Internal(
                "access and refresh signing secrets must differ".to_string(),
            ));
        }

        // Zero leeway so the expiry boundary is exact.
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            issuer: config.issuer,
            audience: config.audience,
            validation,
        })
    }

    /// Access token lifetime in seconds, for `expires_in` responses.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issue a signed access token for the given subject and role.
    pub fn issue_access_token(&self, sub: &str, role: Role) -> Result<String, AuthError> {
        self.issue(TokenKind::Access, sub, role, Utc::now())
    }

    /// Issue a signed refresh token for the given subject and role.
    ///
    /// Returns the token and its expiry, which the caller records in the
    /// refresh-token registry.
    pub fn issue_refresh_token(
        &self,
        sub: &str,
        role: Role,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + self.refresh_ttl;
        let token = self.issue(TokenKind::Refresh, sub, role, now)?;
        Ok((token, expires_at))
    }

    /// Verify an access token, returning its claims.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, &self.access_decoding, &self.validation)
    }

    /// Verify a refresh token, returning its claims. Registry validity is a
    /// separate, explicit check done by callers that need revocation.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(token, &self.refresh_decoding, &self.validation)
    }

    fn issue(
        &self,
        kind: TokenKind,
        sub: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.access_ttl),
            TokenKind::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let claims = Claims {
            sub: sub.to_string(),
            jti: crate::uuid::uuidv7().to_string(),
            role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    fn verify(
        token: &str,
        key: &DecodingKey,
        validation: &Validation,
    ) -> Result<Claims, TokenError> {
        decode::<Claims>(token, key, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
