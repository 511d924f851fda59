use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::FetchError;

/// Largest positive integer used as a subdirectory name under `root`.
async fn highest_numbered_dir(root: &Path) -> std::io::Result<u64> {
    let mut highest = 0;
    let mut entries = tokio::fs::read_dir(root).await?;

    while let Some(entry) = entries.next_entry().await? {
        let Some(number) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u64>().ok())
        else {
            continue;
        };
        if entry.file_type().await?.is_dir() {
            highest = highest.max(number);
        }
    }
    Ok(highest)
}

fn next_number(root: &Path, current: u64) -> Result<u64, FetchError> {
    current.checked_add(1).ok_or_else(|| {
        FetchError::Destination(format!(
            "No folder number left after {} in {}",
            current,
            root.display()
        ))
    })
}

/// Create the next numbered run folder under `root`, creating `root` if needed.
///
/// Returns the new folder and its number. Numbers only ever grow: the new
/// folder is one past the highest existing one, skipping names that are taken.
pub async fn create_next_folder(root: &Path) -> Result<(PathBuf, u64), FetchError> {
    let destination_err = |action: &str, path: &Path, e: std::io::Error| {
        FetchError::Destination(format!("{} {}: {}", action, path.display(), e))
    };

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| destination_err("Failed to create", root, e))?;

    let highest = highest_numbered_dir(root)
        .await
        .map_err(|e| destination_err("Failed to scan", root, e))?;
    let mut number = next_number(root, highest)?;

    loop {
        let candidate = root.join(number.to_string());
        match tokio::fs::create_dir(&candidate).await {
            Ok(()) => {
                info!("Created destination folder {}", candidate.display());
                return Ok((candidate, number));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} already taken", candidate.display());
                number = next_number(root, number)?;
            }
            Err(e) => return Err(destination_err("Failed to create", &candidate, e)),
        }
    }
}
