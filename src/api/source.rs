use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::{MediaDescriptor, Membership};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Chunks of one item's body, in order.
pub type ByteStream = BoxStream<'static, Result<bytes::Bytes>>;

/// The remote side of a fetch: whatever lists media and serves their bytes.
///
/// Authentication and session lifecycle stay inside the implementation.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Make sure the caller may read `target`.
    ///
    /// Must be idempotent: a caller that already has access gets
    /// `Membership::AlreadyMember`, never an error.
    async fn ensure_membership(&self, target: &str) -> Result<Membership>;

    /// Every candidate item behind `target`, in source order.
    async fn enumerate(&self, target: &str) -> Result<Vec<MediaDescriptor>>;

    /// Open the byte stream for one item.
    /// Returns (expected_size, stream)
    async fn open(&self, descriptor: &MediaDescriptor) -> Result<(Option<u64>, ByteStream)>;
}
