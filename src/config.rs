use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::api::ApiConfig;
use crate::application::{FetchSettings, DEFAULT_MIN_BYTES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from `FETCHER_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_root: PathBuf,
    pub min_bytes: u64,
    pub fetch: FetchSettings,
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fetch_defaults = FetchSettings::default();
        let api_defaults = ApiConfig::default();

        let output_root = get("FETCHER_OUTPUT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("downloads"));
        let min_bytes = parse_or(&get, "FETCHER_MIN_BYTES", DEFAULT_MIN_BYTES)?;

        let item_timeout = parse_or(
            &get,
            "FETCHER_ITEM_TIMEOUT_SECS",
            fetch_defaults.item_timeout.as_secs(),
        )?;
        let item_retries = parse_or(&get, "FETCHER_ITEM_RETRIES", fetch_defaults.item_retries)?;
        let retry_delay_ms = parse_or(
            &get,
            "FETCHER_RETRY_DELAY_MS",
            fetch_defaults.retry_delay.as_millis() as u64,
        )?;
        let connect_timeout = parse_or(
            &get,
            "FETCHER_CONNECT_TIMEOUT_SECS",
            api_defaults.connect_timeout.as_secs(),
        )?;

        let request_timeout = parse_or(
            &get,
            "FETCHER_REQUEST_TIMEOUT_SECS",
            api_defaults.request_timeout.as_secs(),
        )?;

        for (key, value) in [
            ("FETCHER_ITEM_TIMEOUT_SECS", item_timeout),
            ("FETCHER_REQUEST_TIMEOUT_SECS", request_timeout),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                });
            }
        }

        Ok(Self {
            output_root,
            min_bytes,
            fetch: FetchSettings {
                item_timeout: Duration::from_secs(item_timeout),
                item_retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
            },
            api: ApiConfig {
                user_agent: get("FETCHER_USER_AGENT").unwrap_or(api_defaults.user_agent),
                auth_token: get("FETCHER_AUTH_TOKEN"),
                connect_timeout: Duration::from_secs(connect_timeout),
                request_timeout: Duration::from_secs(request_timeout),
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.output_root, PathBuf::from("downloads"));
        assert_eq!(config.min_bytes, 5120);
        assert_eq!(config.fetch.item_timeout, Duration::from_secs(60));
        assert_eq!(config.fetch.item_retries, 1);
        assert_eq!(config.api.user_agent, "Mozilla/5.0");
        assert!(config.api.auth_token.is_none());
        assert_eq!(config.api.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("FETCHER_OUTPUT_ROOT", "/srv/media"),
            ("FETCHER_MIN_BYTES", " 40000 "),
            ("FETCHER_ITEM_RETRIES", "3"),
            ("FETCHER_RETRY_DELAY_MS", "0"),
            ("FETCHER_AUTH_TOKEN", "abc123"),
            ("FETCHER_USER_AGENT", ""),
        ])
        .unwrap();

        assert_eq!(config.output_root, PathBuf::from("/srv/media"));
        assert_eq!(config.min_bytes, 40_000);
        assert_eq!(config.fetch.item_retries, 3);
        assert!(config.fetch.retry_delay.is_zero());
        assert_eq!(config.api.auth_token.as_deref(), Some("abc123"));
        assert_eq!(config.api.user_agent, "Mozilla/5.0");
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("FETCHER_MIN_BYTES", "5KB")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "FETCHER_MIN_BYTES", .. }
        ));

        assert!(config_from(&[("FETCHER_ITEM_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("FETCHER_REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }
}
