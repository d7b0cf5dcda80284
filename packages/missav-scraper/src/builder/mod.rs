//! Snapshot cache builder.
//!
//! Fetches the search page for a keyword, follows the first matching detail
//! link and saves both pages as snapshots. Backends are tried in order
//! (headless browser first, then the HTTP client); the first one that gets
//! all the way to a detail page wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use missav_scraper::{ScraperConfig, SnapshotBuilder};
//!
//! let builder = SnapshotBuilder::with_default_backends(ScraperConfig::from_env()?)?;
//! let pair = builder.build("ABP-123").await?;
//! println!("detail page saved to {}", pair.detail_path.display());
//! ```

mod links;
mod runners;

pub use links::{collect_links, pick_first_target};
pub use runners::{InProcessCacheBuilder, NoopCacheBuilder, ProcessCacheBuilder};

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};
use url::Url;

use crate::cache::{snapshot_file_name, SnapshotKind};
use crate::config::ScraperConfig;
use crate::error::{FetchError, FetchResult};
use crate::fetchers::{ChromeFetcher, HttpFetcher};
use crate::traits::fetcher::PageFetcher;

/// Snapshots written by one successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub target_url: String,
    pub search_path: PathBuf,
    pub detail_path: PathBuf,
}

/// Populates the snapshot cache using an ordered list of fetch backends.
pub struct SnapshotBuilder {
    config: ScraperConfig,
    backends: Vec<Box<dyn PageFetcher>>,
}

impl SnapshotBuilder {
    /// Create a builder with no backends.
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            backends: Vec::new(),
        }
    }

    /// Headless Chrome, then the HTTP client.
    pub fn with_default_backends(config: ScraperConfig) -> FetchResult<Self> {
        let chrome = ChromeFetcher::new(&config);
        let http = HttpFetcher::new(&config)?;
        Ok(Self::new(config).with_backend(chrome).with_backend(http))
    }

    /// Append a backend; earlier backends are preferred.
    pub fn with_backend(mut self, backend: impl PageFetcher + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Build snapshots for `keyword` with the first backend that succeeds.
    pub async fn build(&self, keyword: &str) -> FetchResult<SnapshotPair> {
        let keyword = keyword.trim();
        tokio::fs::create_dir_all(&self.config.cache_dir).await?;

        let search_url = self.config.search_url(keyword);
        info!(keyword = %keyword, search_url = %search_url, "Building snapshot cache");

        for backend in &self.backends {
            match self
                .fetch_search_and_detail(backend.as_ref(), &search_url, keyword)
                .await
            {
                Ok(pair) => {
                    info!(
                        backend = backend.name(),
                        target_url = %pair.target_url,
                        "Snapshot cache built"
                    );
                    return Ok(pair);
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Backend failed, trying next");
                }
            }
        }

        Err(FetchError::AllBackendsFailed {
            keyword: keyword.to_string(),
        })
    }

    /// Fetch and save the search page, then the first matching detail page.
    ///
    /// The search snapshot is kept even when no detail link is found.
    pub async fn fetch_search_and_detail(
        &self,
        backend: &dyn PageFetcher,
        search_url: &str,
        keyword: &str,
    ) -> FetchResult<SnapshotPair> {
        let base = Url::parse(&self.config.base_url).map_err(|_| FetchError::InvalidUrl {
            url: self.config.base_url.clone(),
        })?;
        let host = self.config.site_host().unwrap_or_default();

        info!(backend = backend.name(), url = %search_url, "Opening search page");
        let search_html = backend.fetch_html(search_url).await?;
        let search_path = self
            .save_snapshot(keyword, SnapshotKind::Search, &search_html)
            .await?;

        let links = collect_links(&search_html, &host);
        let target_url =
            pick_first_target(&links, keyword, &base).ok_or_else(|| FetchError::NoTargetLink {
                keyword: keyword.to_string(),
            })?;

        info!(backend = backend.name(), url = %target_url, "Found detail link");
        let detail_html = backend.fetch_html(&target_url).await?;
        let detail_path = self
            .save_snapshot(keyword, SnapshotKind::Detail, &detail_html)
            .await?;

        Ok(SnapshotPair {
            target_url,
            search_path,
            detail_path,
        })
    }

    async fn save_snapshot(
        &self,
        keyword: &str,
        kind: SnapshotKind,
        html: &str,
    ) -> FetchResult<PathBuf> {
        let path = self
            .config
            .cache_dir
            .join(snapshot_file_name(keyword, kind, Local::now()));
        tokio::fs::write(&path, html).await?;
        info!(path = %path.display(), kind = %kind, "Snapshot saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::testing::MockFetcher;
    use std::path::Path;

    const SEARCH: &str = r#"<html><body>
        <a href="/ja/search/abp-123">again</a>
        <a href="/ja/abp-123">ABP-123</a>
        </body></html>"#;
    const DETAIL: &str = r#"<html><head><meta property="og:title" content="ABP-123 Title"></head></html>"#;

    fn config(dir: &Path) -> ScraperConfig {
        ScraperConfig::new()
            .with_cache_dir(dir)
            .with_prefer_env_proxy(false)
    }

    #[tokio::test]
    async fn test_first_backend_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let first = MockFetcher::new()
            .with_page("https://missav.ai/ja/search/ABP-123", SEARCH)
            .with_page("https://missav.ai/ja/abp-123", DETAIL);
        let second = MockFetcher::new();

        let builder = SnapshotBuilder::new(config(tmp.path()))
            .with_backend(first.clone())
            .with_backend(second.clone());
        let pair = builder.build("ABP-123").await.unwrap();

        assert_eq!(pair.target_url, "https://missav.ai/ja/abp-123");
        assert_eq!(second.call_count(), 0);
        let candidates = CacheStore::new(tmp.path()).list_candidates("ABP-123").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(std::fs::read_to_string(&pair.detail_path).unwrap(), DETAIL);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_backend() {
        let tmp = tempfile::tempdir().unwrap();
        let broken = MockFetcher::new().failing_with_status(403);
        let working = MockFetcher::new()
            .with_page("https://missav.ai/ja/search/ABP-123", SEARCH)
            .with_page("https://missav.ai/ja/abp-123", DETAIL);

        let builder = SnapshotBuilder::new(config(tmp.path()))
            .with_backend(broken.clone())
            .with_backend(working.clone());
        builder.build("ABP-123").await.unwrap();

        assert_eq!(broken.call_count(), 1);
        assert_eq!(working.call_count(), 2);
    }

    #[tokio::test]
    async fn test_search_snapshot_kept_without_detail_link() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = MockFetcher::new().with_page(
            "https://missav.ai/ja/search/ABP-123",
            "<html><body><a href='/ja/other'>x</a></body></html>",
        );

        let builder = SnapshotBuilder::new(config(tmp.path())).with_backend(backend);
        let err = builder.build("ABP-123").await.unwrap_err();

        assert!(matches!(err, FetchError::AllBackendsFailed { .. }));
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("ABP-123_search_"));
    }

    #[tokio::test]
    async fn test_creates_cache_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cache");
        let builder = SnapshotBuilder::new(config(&dir));
        assert!(builder.build("ABP-123").await.is_err());
        assert!(dir.is_dir());
    }
}
