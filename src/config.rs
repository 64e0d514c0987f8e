use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

/// Where the notes service asks whether a user is registered.
#[derive(Debug, Clone, Deserialize)]
pub struct UserServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

const DEFAULT_TTL_MINUTES: i64 = 365 * 24 * 60;
const MAX_TTL_MINUTES: i64 = 10 * DEFAULT_TTL_MINUTES;

/// Token lifetime in minutes, bounded to 1..=10 years so expiry arithmetic cannot overflow.
fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_MINUTES is not a whole number: {raw:?}"))?;
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret = get("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set to a non-empty value")?;
        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "notekeep".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "notekeep-users".into()),
            ttl_minutes: match get("JWT_TTL_MINUTES") {
                None => DEFAULT_TTL_MINUTES,
                Some(raw) => parse_ttl_minutes(&raw)?,
            },
        };
        Ok(Self { database_url, jwt })
    }
}

impl UserServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: get("AUTH_SERVICE_URL").unwrap_or_else(|| "http://auth:8080".into()),
            timeout_ms: get("USER_CHECK_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(3_000),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
