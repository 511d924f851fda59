use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::models::{ApiConfig, ManifestEntry};
use super::source::{ApiError, ByteStream, MediaSource, Result};
use crate::domain::{MediaDescriptor, Membership};
use crate::utils::{
    extension_from_content_type, extension_from_url, normalize_extension, DEFAULT_EXTENSION,
};

/// A manifest line resolved against the manifest URL.
#[derive(Debug, Clone)]
struct ResolvedEntry {
    url: Url,
    size: Option<u64>,
    extension: Option<String>,
}

/// Media source backed by a plain HTTP manifest.
///
/// The target is the URL of a manifest listing media URLs, either as a JSON
/// array or one URL per line. Sizes and types are read with `HEAD` unless
/// the manifest already carries them.
#[derive(Clone)]
pub struct HttpMediaSource {
    client: Client,
    config: ApiConfig,
}

impl HttpMediaSource {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check_status(url: &str, status: StatusCode) -> Result<()> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::AccessDenied(url.to_string()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(url.to_string())),
            s => Err(ApiError::Status {
                url: url.to_string(),
                status: s.as_u16(),
            }),
        }
    }

    fn parse_target(target: &str) -> Result<Url> {
        let url = Url::parse(target.trim())
            .map_err(|e| ApiError::InvalidTarget(format!("{}: {}", target, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ApiError::InvalidTarget(format!(
                "unsupported scheme '{}'",
                other
            ))),
        }
    }

    fn parse_manifest(base: &Url, body: &str) -> Result<Vec<ResolvedEntry>> {
        let trimmed = body.trim_start();

        let entries: Vec<ManifestEntry> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)
                .map_err(|e| ApiError::InvalidManifest(format!("JSON decode error: {}", e)))?
        } else {
            trimmed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| ManifestEntry::Url(line.to_string()))
                .collect()
        };

        entries
            .into_iter()
            .map(|entry| {
                let url = base.join(entry.url()).map_err(|e| {
                    ApiError::InvalidManifest(format!("bad URL '{}': {}", entry.url(), e))
                })?;
                let (size, extension) = match entry {
                    ManifestEntry::Url(_) => (None, None),
                    ManifestEntry::Detailed {
                        size, extension, ..
                    } => (size, extension.as_deref().and_then(normalize_extension)),
                };
                Ok(ResolvedEntry {
                    url,
                    size,
                    extension,
                })
            })
            .collect()
    }

    fn resolve_extension(entry: &ResolvedEntry, content_type: Option<&str>) -> String {
        entry
            .extension
            .clone()
            .or_else(|| extension_from_url(&entry.url))
            .or_else(|| content_type.and_then(extension_from_content_type).map(String::from))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Build a descriptor, probing with `HEAD` when the manifest lacks size or type.
    async fn describe(&self, entry: &ResolvedEntry) -> MediaDescriptor {
        if let (Some(size), Some(ext)) = (entry.size, entry.extension.as_ref()) {
            return MediaDescriptor::new(entry.url.as_str(), size, ext.clone(), true);
        }

        let head = self
            .authorize(self.client.head(entry.url.clone()))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(ApiError::from)
            .and_then(|response| {
                Self::check_status(entry.url.as_str(), response.status())?;
                Ok(response)
            });

        match head {
            Ok(response) => {
                let headers = response.headers();
                // reqwest reports a zero body hint for HEAD, so read the header itself
                let size = entry
                    .size
                    .or_else(|| {
                        headers
                            .get(CONTENT_LENGTH)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.trim().parse().ok())
                    })
                    .unwrap_or(0);
                let content_type = headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_ascii_lowercase());

                let is_downloadable = !content_type
                    .as_deref()
                    .is_some_and(|ct| ct.starts_with("text/"));
                let extension = Self::resolve_extension(entry, content_type.as_deref());

                debug!(
                    "HEAD {}: {} bytes, type {:?}",
                    entry.url, size, content_type
                );
                MediaDescriptor::new(entry.url.as_str(), size, extension, is_downloadable)
            }
            Err(e) => {
                warn!("HEAD failed for {}: {}", entry.url, e);
                MediaDescriptor::new(
                    entry.url.as_str(),
                    entry.size.unwrap_or(0),
                    Self::resolve_extension(entry, None),
                    false,
                )
            }
        }
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn ensure_membership(&self, target: &str) -> Result<Membership> {
        Self::parse_target(target)?;
        Ok(Membership::NotRequired)
    }

    async fn enumerate(&self, target: &str) -> Result<Vec<MediaDescriptor>> {
        let manifest_url = Self::parse_target(target)?;

        let response = self
            .authorize(self.client.get(manifest_url.clone()))
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        Self::check_status(manifest_url.as_str(), response.status())?;
        let body = response.text().await?;

        let entries = Self::parse_manifest(&manifest_url, &body)?;
        info!("Manifest {} lists {} entries", manifest_url, entries.len());

        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in &entries {
            descriptors.push(self.describe(entry).await);
        }
        Ok(descriptors)
    }

    async fn open(&self, descriptor: &MediaDescriptor) -> Result<(Option<u64>, ByteStream)> {
        let url = Url::parse(&descriptor.locator)
            .map_err(|e| ApiError::InvalidTarget(format!("{}: {}", descriptor.locator, e)))?;

        let response = self.authorize(self.client.get(url)).send().await?;
        Self::check_status(&descriptor.locator, response.status())?;

        let total_size = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(|e| ApiError::Stream(e.to_string()))
            .boxed();

        Ok((total_size, stream))
    }
}
