//! API server configuration.

use chrono::Duration;
use thiserror::Error;

use storerate_core::auth::password::DEFAULT_BCRYPT_COST;
use storerate_core::auth::token::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, TokenConfig,
};

/// Configuration failures. All of these are fatal at startup: running with
/// a bad signing setup would silently mint invalid tokens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    MissingSecret(&'static str),

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    IdenticalSecrets,

    #[error("invalid duration for {name}: {value}")]
    InvalidDuration { name: &'static str, value: String },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Access-token signing secret.
    pub access_secret: String,
    /// Refresh-token signing secret. Must differ from the access secret.
    pub refresh_secret: String,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// Token issuer string.
    pub issuer: String,
    /// Token audience string.
    pub audience: String,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
    /// Rotate refresh tokens on each use.
    pub rotate_refresh_tokens: bool,
    /// Period of the registry expiry sweep.
    pub sweep_interval: std::time::Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable               | Default                           |
    /// |------------------------|-----------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3000`                  |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/storerate` |
    /// | `ACCESS_TOKEN_SECRET`  | required                          |
    /// | `REFRESH_TOKEN_SECRET` | required, distinct                |
    /// | `ACCESS_TOKEN_TTL`     | `1h`                              |
    /// | `REFRESH_TOKEN_TTL`    | `7d`                              |
    /// | `TOKEN_ISSUER`         | `storerate`                       |
    /// | `TOKEN_AUDIENCE`       | `storerate-clients`               |
    /// | `BCRYPT_COST`          | `12`                              |
    /// | `REFRESH_ROTATION`     | `true`                            |
    /// | `SWEEP_INTERVAL`       | `1h`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_secret = require_secret("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = require_secret("REFRESH_TOKEN_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::IdenticalSecrets);
        }

        let access_ttl = duration_var("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl = duration_var("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TTL_SECS)?;
        let sweep_secs = duration_var("SWEEP_INTERVAL", 60 * 60)?.num_seconds();

        let bcrypt_cost = match std::env::var("BCRYPT_COST") {
            Err(_) => DEFAULT_BCRYPT_COST,
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or(ConfigError::InvalidValue {
                    name: "BCRYPT_COST",
                    value: raw,
                })?,
        };

        let rotate_refresh_tokens = match std::env::var("REFRESH_ROTATION") {
            Err(_) => true,
            Ok(raw) => match raw.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "REFRESH_ROTATION",
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/storerate".into()),
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
            issuer: std::env::var("TOKEN_ISSUER").unwrap_or_else(|_| "storerate".into()),
            audience: std::env::var("TOKEN_AUDIENCE")
                .unwrap_or_else(|_| "storerate-clients".into()),
            bcrypt_cost,
            rotate_refresh_tokens,
            sweep_interval: std::time::Duration::from_secs(sweep_secs.max(1) as u64),
        })
    }

    /// The signing configuration for [`storerate_core::auth::token::TokenService`].
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }
}

fn require_secret(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}

fn duration_var(name: &'static str, default_secs: i64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(Duration::seconds(default_secs)),
        Ok(raw) => parse_duration(&raw).ok_or(ConfigError::InvalidDuration { name, value: raw }),
    }
}

/// Parse durations like `30s`, `15m`, `1h`, `7d`. A bare number is seconds.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (value, unit) = match raw.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&raw[..i], Some(c)),
        _ => (raw, None),
    };
    let value: i64 = value.parse().ok()?;
    if value < 0 {
        return None;
    }
    let seconds = match unit {
        None | Some('s') => value,
        Some('m') => value * 60,
        Some('h') => value * 60 * 60,
        Some('d') => value * 24 * 60 * 60,
        _ => return None,
    };
    Some(Duration::seconds(seconds))
}
