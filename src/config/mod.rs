use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use crate::reclaim::ReclaimPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub reclaim_policy: String,
    pub sweep_interval_ms: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Only `JWT_SECRET` is required; everything else falls back to the
    /// defaults of the login service (6s tokens, 1s sweep, port 8080).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let config = Config {
            jwt_secret,
            token_ttl_secs: parse_or(&lookup, "TOKEN_TTL_SECS", 6)?,
            reclaim_policy: lookup("RECLAIM_POLICY").unwrap_or_else(|| "sweep".into()),
            sweep_interval_ms: parse_or(&lookup, "SWEEP_INTERVAL_MS", 1000)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
        };

        let ttl_in_range = i64::try_from(config.token_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .is_some_and(|ttl| Utc::now().checked_add_signed(ttl).is_some());
        if config.token_ttl_secs == 0 || !ttl_in_range {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: config.token_ttl_secs.to_string(),
            });
        }
        // reject unknown policies at startup rather than on first login
        config.policy()?;

        Ok(config)
    }

    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.token_ttl_secs as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn policy(&self) -> Result<ReclaimPolicy, ConfigError> {
        match self.reclaim_policy.trim().to_ascii_lowercase().as_str() {
            "sweep" if self.sweep_interval_ms > 0 => Ok(ReclaimPolicy::Sweep {
                interval: self.sweep_interval(),
            }),
            "sweep" => Err(ConfigError::Invalid {
                key: "SWEEP_INTERVAL_MS",
                value: self.sweep_interval_ms.to_string(),
            }),
            "deferred" => Ok(ReclaimPolicy::Deferred),
            _ => Err(ConfigError::Invalid {
                key: "RECLAIM_POLICY",
                value: self.reclaim_policy.clone(),
            }),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
