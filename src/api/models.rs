use std::time::Duration;

use serde::Deserialize;

/// One entry of a JSON manifest: either a bare URL or a URL with hints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ManifestEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        size: Option<u64>,
        #[serde(default, alias = "ext")]
        extension: Option<String>,
    },
}

impl ManifestEntry {
    pub fn url(&self) -> &str {
        match self {
            ManifestEntry::Url(url) => url,
            ManifestEntry::Detailed { url, .. } => url,
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub user_agent: String,
    /// Sent as a bearer token on every request when present.
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    /// Limit for manifest and HEAD requests. Item downloads use the
    /// per-item timeout instead.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}
