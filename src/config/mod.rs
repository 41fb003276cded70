//! Environment-driven configuration.
//!
//! All settings come from environment variables (a `.env` file is loaded at
//! startup by the binary). Feed settings are only required by the sync
//! path; cache settings always resolve, with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    optional_env(key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })
}

fn parse_url_env(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    })
}

pub(crate) fn parse_ttl_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a number of seconds, got '{raw}'"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "TTL must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Cache settings. Always resolvable; every value has a default.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let dir = optional_env("MATTERHUB_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".matterhub-cache"));

        let ttl = match optional_env("MATTERHUB_CACHE_TTL_SECS") {
            Some(raw) => parse_ttl_secs("MATTERHUB_CACHE_TTL_SECS", &raw)?,
            None => Duration::from_secs(15 * 60),
        };

        Ok(Self { dir, ttl })
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl.as_millis() as i64
    }
}

/// Endpoints and function codes for the three matter feeds.
///
/// The legacy feeds live behind the portal's proxy and take their function
/// code as a `code` query parameter, the way the upstream Azure Functions
/// expect it. The VNet feed is addressed directly.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub proxy_base_url: Url,
    pub all_matters_path: String,
    pub all_matters_code: String,
    pub user_matters_path: String,
    pub user_matters_code: String,
    pub vnet_matters_url: Url,
    pub vnet_matters_code: String,
}

impl FeedConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let proxy_base_url = parse_url_env(
            "MATTERHUB_PROXY_BASE_URL",
            &require_env("MATTERHUB_PROXY_BASE_URL")?,
        )?;
        let vnet_matters_url = parse_url_env(
            "MATTERHUB_VNET_MATTERS_URL",
            &require_env("MATTERHUB_VNET_MATTERS_URL")?,
        )?;

        Ok(Self {
            proxy_base_url,
            all_matters_path: optional_env("MATTERHUB_ALL_MATTERS_PATH")
                .unwrap_or_else(|| "getAllMatters".to_string()),
            all_matters_code: require_env("MATTERHUB_ALL_MATTERS_CODE")?,
            user_matters_path: optional_env("MATTERHUB_USER_MATTERS_PATH")
                .unwrap_or_else(|| "getMatters".to_string()),
            user_matters_code: require_env("MATTERHUB_USER_MATTERS_CODE")?,
            vnet_matters_url,
            vnet_matters_code: require_env("MATTERHUB_VNET_MATTERS_CODE")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_parsing_rejects_junk_and_zero() {
        assert!(parse_ttl_secs("K", "900").is_ok());
        assert_eq!(
            parse_ttl_secs("K", "900").unwrap(),
            Duration::from_secs(900)
        );
        assert!(parse_ttl_secs("K", "soon").is_err());
        assert!(parse_ttl_secs("K", "0").is_err());
    }
}
