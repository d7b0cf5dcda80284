//! Testing utilities including mock implementations.
//!
//! These let applications exercise the resolver without network access,
//! a browser, or a real cache builder.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{Duration, Local};

use crate::cache::{snapshot_file_name, SnapshotKind};
use crate::error::{FetchError, FetchResult};
use crate::traits::cache_builder::{BuildOutcome, CacheBuilder};
use crate::traits::fetcher::PageFetcher;

/// Mock page fetcher returning canned HTML by URL.
///
/// Unknown URLs answer HTTP 404. Clones share pages and call history.
///
/// # Example
///
/// ```rust
/// use missav_scraper::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new().with_page("https://missav.ai/ja/abp-123", "<html></html>");
/// assert_eq!(fetcher.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failure: Arc<RwLock<Option<u16>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page (builder pattern).
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.add_page(url, html);
        self
    }

    pub fn add_page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.write().unwrap().insert(url.into(), html.into());
    }

    /// Answer every request with this HTTP status.
    pub fn failing_with_status(self, status: u16) -> Self {
        *self.failure.write().unwrap() = Some(status);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(status) = *self.failure.read().unwrap() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock cache builder that drops configured snapshots into a directory.
///
/// Each run writes every configured detail page, one second apart, so file
/// names sort in the order the pages were added.
#[derive(Clone)]
pub struct MockCacheBuilder {
    cache_dir: PathBuf,
    snapshots: Arc<RwLock<Vec<(String, String)>>>,
    outcome: Arc<RwLock<Option<BuildOutcome>>>,
    runs: Arc<RwLock<Vec<String>>>,
}

impl MockCacheBuilder {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            snapshots: Arc::new(RwLock::new(Vec::new())),
            outcome: Arc::new(RwLock::new(None)),
            runs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Write a detail snapshot for `key` on every run (builder pattern).
    pub fn with_detail(self, key: impl Into<String>, html: impl Into<String>) -> Self {
        self.snapshots
            .write()
            .unwrap()
            .push((key.into(), html.into()));
        self
    }

    /// Report this outcome instead of the default.
    pub fn with_outcome(self, outcome: BuildOutcome) -> Self {
        *self.outcome.write().unwrap() = Some(outcome);
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    /// Keys passed to `run`, in order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.read().unwrap().clone()
    }
}

#[async_trait]
impl CacheBuilder for MockCacheBuilder {
    async fn run(&self, query_key: &str) -> BuildOutcome {
        self.runs.write().unwrap().push(query_key.to_string());

        let snapshots = self.snapshots.read().unwrap().clone();
        if !snapshots.is_empty() {
            if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
                return BuildOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }
        let start = Local::now();
        for (i, (key, html)) in snapshots.iter().enumerate() {
            let at = start + Duration::seconds(i as i64);
            let path = self
                .cache_dir
                .join(snapshot_file_name(key, SnapshotKind::Detail, at));
            if let Err(e) = std::fs::write(&path, html) {
                return BuildOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        self.outcome
            .read()
            .unwrap()
            .clone()
            .unwrap_or(if snapshots.is_empty() {
                BuildOutcome::Skipped {
                    reason: "no snapshots configured".to_string(),
                }
            } else {
                BuildOutcome::Built { target_url: None }
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
