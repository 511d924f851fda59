use std::path::PathBuf;

use super::FetchError;

/// Metadata for one remote media item, known before any bytes are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Opaque handle understood by the source that produced it.
    pub locator: String,
    pub approximate_size_bytes: u64,
    /// Lowercase, without the leading dot.
    pub suggested_extension: String,
    pub is_downloadable: bool,
}

impl MediaDescriptor {
    pub fn new(
        locator: impl Into<String>,
        approximate_size_bytes: u64,
        suggested_extension: impl Into<String>,
        is_downloadable: bool,
    ) -> Self {
        Self {
            locator: locator.into(),
            approximate_size_bytes,
            suggested_extension: suggested_extension.into(),
            is_downloadable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadPlan {
    pub total_count: usize,
    pub estimated_total_bytes: u64,
    pub requested_count: usize,
    /// Estimated size of the first `requested_count` items.
    pub requested_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// 1-based position within the plan.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub destination: PathBuf,
    pub saved: Vec<PathBuf>,
    pub failed: Vec<FailedItem>,
    pub bytes_written: u64,
}

impl FetchReport {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            saved: Vec::new(),
            failed: Vec::new(),
            bytes_written: 0,
        }
    }

    pub fn failed_positions(&self) -> Vec<usize> {
        self.failed.iter().map(|item| item.position).collect()
    }
}

/// Outcome of asking the source for access to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Joined,
    AlreadyMember,
    NotRequired,
}

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started {
        position: usize,
        total: usize,
        file_name: String,
    },
    Progress {
        position: usize,
        total: usize,
        downloaded: u64,
        expected: Option<u64>,
    },
    Completed {
        position: usize,
        total: usize,
        path: PathBuf,
        bytes: u64,
    },
    Failed {
        position: usize,
        total: usize,
        error: FetchError,
    },
}
