//! In-memory media source for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use super::source::{ApiError, ByteStream, MediaSource, Result};
use crate::domain::{MediaDescriptor, Membership};

#[derive(Debug, Clone, Default)]
pub struct FakeItem {
    pub chunks: Vec<Bytes>,
    /// The first `fail_opens` calls to `open` fail.
    pub fail_opens: usize,
    /// Yield this many chunks, then an error.
    pub fail_after: Option<usize>,
    /// Yield all chunks, then never finish.
    pub stall: bool,
}

impl FakeItem {
    pub fn with_data(data: &[u8]) -> Self {
        let chunks = data
            .chunks(4096)
            .map(Bytes::copy_from_slice)
            .collect::<Vec<_>>();
        Self {
            chunks,
            ..Self::default()
        }
    }
}

pub struct FakeMediaSource {
    descriptors: Vec<MediaDescriptor>,
    items: HashMap<String, FakeItem>,
    unavailable: Option<String>,
    membership: Membership,
    opens: Mutex<HashMap<String, usize>>,
}

impl FakeMediaSource {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            items: HashMap::new(),
            unavailable: None,
            membership: Membership::AlreadyMember,
            opens: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_item(mut self, descriptor: MediaDescriptor, item: FakeItem) -> Self {
        self.items.insert(descriptor.locator.clone(), item);
        self.descriptors.push(descriptor);
        self
    }

    /// Shorthand for a healthy item whose advertised size matches its data.
    pub fn with_file(self, locator: &str, ext: &str, data: &[u8]) -> Self {
        let descriptor = MediaDescriptor::new(locator, data.len() as u64, ext, true);
        self.with_item(descriptor, FakeItem::with_data(data))
    }

    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    pub fn membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    pub fn open_count(&self, locator: &str) -> usize {
        self.opens
            .lock()
            .map(|opens| opens.get(locator).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl MediaSource for FakeMediaSource {
    async fn ensure_membership(&self, target: &str) -> Result<Membership> {
        match &self.unavailable {
            Some(reason) => Err(ApiError::AccessDenied(format!("{}: {}", target, reason))),
            None => Ok(self.membership),
        }
    }

    async fn enumerate(&self, _target: &str) -> Result<Vec<MediaDescriptor>> {
        Ok(self.descriptors.clone())
    }

    async fn open(&self, descriptor: &MediaDescriptor) -> Result<(Option<u64>, ByteStream)> {
        let attempt = {
            let mut opens = self.opens.lock().unwrap();
            let count = opens.entry(descriptor.locator.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let item = self
            .items
            .get(&descriptor.locator)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(descriptor.locator.clone()))?;

        if attempt <= item.fail_opens {
            return Err(ApiError::Stream("connection reset".to_string()));
        }

        let total: u64 = item.chunks.iter().map(|c| c.len() as u64).sum();
        let stream: ByteStream = match item.fail_after {
            Some(n) => stream::iter(item.chunks.into_iter().take(n).map(Ok))
                .chain(stream::once(async {
                    Err(ApiError::Stream("peer closed connection".to_string()))
                }))
                .boxed(),
            None if item.stall => stream::iter(item.chunks.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
            None => stream::iter(item.chunks.into_iter().map(Ok)).boxed(),
        };

        Ok((Some(total), stream))
    }
}
