use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{safe_key, SnapshotKind};
use crate::error::ParseError;

/// Reference to a detail snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub path: PathBuf,
    pub file_name: String,
}

impl SnapshotRef {
    /// Read the snapshot, decoding invalid UTF-8 lossily.
    ///
    /// An empty or whitespace-only file cannot be parsed into a page.
    pub async fn read(&self) -> Result<String, ParseError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ParseError::Read {
                path: self.path.clone(),
                source,
            })?;
        let markup = String::from_utf8_lossy(&bytes).into_owned();
        if markup.trim().is_empty() {
            return Err(ParseError::Empty {
                path: self.path.clone(),
            });
        }
        Ok(markup)
    }
}

/// Read-only view of the snapshot directory, plus bulk purge.
///
/// Never writes snapshots; that belongs to the cache builder.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Detail snapshots for `query_key`, sorted by file name.
    ///
    /// The prefix is tried lowercased, uppercased and as given. A missing
    /// directory yields no candidates.
    pub fn list_candidates(&self, query_key: &str) -> io::Result<Vec<SnapshotRef>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let marker = format!("_{}_", SnapshotKind::Detail);
        let key = safe_key(query_key);
        let wanted = [key.to_lowercase(), key.to_uppercase(), key].map(|k| format!("{k}{marker}"));

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !file_name.contains(&marker) || !file_name.ends_with(".html") {
                continue;
            }
            if !entry.path().is_file() {
                continue;
            }
            if wanted.iter().any(|p| file_name.starts_with(p.as_str())) {
                candidates.push(SnapshotRef {
                    path: entry.path(),
                    file_name,
                });
            }
        }

        candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        debug!(
            dir = %self.dir.display(),
            query_key = %query_key,
            count = candidates.len(),
            "Listed cached detail snapshots"
        );
        Ok(candidates)
    }

    /// Delete every entry directly inside the directory, keeping the
    /// directory itself. Failures are logged and skipped.
    ///
    /// Returns the number of entries removed.
    pub fn purge_all(&self) -> usize {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(dir = %self.dir.display(), error = %e, "Failed to list cache for purge");
                }
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            match remove_entry(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
                }
            }
        }

        debug!(dir = %self.dir.display(), removed, "Purged cache");
        removed
    }
}

/// Symlinks are removed as links, never followed.
fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
