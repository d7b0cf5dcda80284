//! On-disk page snapshots.
//!
//! Snapshots are written by the cache builder and read (then purged) by the
//! resolver. File names follow `{key}_{kind}_{YYYYmmdd_HHMMSS}.html`.

mod store;

pub use store::{CacheStore, SnapshotRef};

use chrono::{DateTime, Local};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// File written by the standalone builder next to its snapshots.
pub const RUN_LOG_FILE: &str = "missav_run.log";

static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-]+").expect("valid regex"));

/// Which page a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Search,
    Detail,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Search => "search",
            SnapshotKind::Detail => "detail",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key as it appears in file names: runs of unsafe characters become `_`.
pub fn safe_key(key: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(key.trim(), "_").into_owned()
}

/// `{key}_{kind}_` prefix shared by all snapshots of one kind for a key.
pub fn snapshot_prefix(key: &str, kind: SnapshotKind) -> String {
    format!("{}_{}_", safe_key(key), kind)
}

/// Full file name for a snapshot taken at `at`.
pub fn snapshot_file_name(key: &str, kind: SnapshotKind, at: DateTime<Local>) -> String {
    format!(
        "{}{}.html",
        snapshot_prefix(key, kind),
        at.format("%Y%m%d_%H%M%S")
    )
}
