//! Identifier resolution: cache first, then the live site.
//!
//! One resolution runs these steps in order:
//!
//! 1. Normalize the identifier into a query key.
//! 2. Ask the cache builder to pre-warm snapshots (best-effort).
//! 3. List detail snapshots for the key; pick the best one and extract.
//! 4. If that produced no title, search the site and fetch the detail page.
//!
//! Whenever step 3 found snapshots, the cache directory is purged exactly
//! once before returning, on success and on failure alike.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStore, SnapshotRef};
use crate::config::ScraperConfig;
use crate::error::{ParseError, Result, ScrapeError};
use crate::extract::{extract, Document, SearchResults};
use crate::identifier::{normalize, NormalizedId};
use crate::selector::{select_best, Candidate};
use crate::traits::cache_builder::{BuildOutcome, CacheBuilder};
use crate::traits::fetcher::PageFetcher;
use crate::types::MovieInfo;

/// Resolves identifiers to [`MovieInfo`] records.
///
/// Calls on one resolver are serialized: the cache directory is shared
/// state and is purged at the end of each resolution. Resolvers pointing at
/// the same directory must not run concurrently.
pub struct Resolver<F, B> {
    config: ScraperConfig,
    fetcher: F,
    builder: B,
    store: CacheStore,
    in_flight: Mutex<()>,
}

impl<F: PageFetcher, B: CacheBuilder> Resolver<F, B> {
    /// `fetcher` serves the online path; `builder` pre-warms the cache.
    pub fn new(config: ScraperConfig, fetcher: F, builder: B) -> Self {
        let store = CacheStore::new(config.cache_dir.clone());
        Self {
            config,
            fetcher,
            builder,
            store,
            in_flight: Mutex::new(()),
        }
    }

    /// Resolve a fresh record for `id`.
    pub async fn resolve_id(&self, id: &str) -> Result<MovieInfo> {
        let mut movie = MovieInfo::new(id);
        self.resolve(&mut movie).await?;
        Ok(movie)
    }

    /// Fill `movie` from the cache or the site.
    ///
    /// Fields are written in place; on error, whatever was already written
    /// stays.
    pub async fn resolve(&self, movie: &mut MovieInfo) -> Result<()> {
        let _guard = self.in_flight.lock().await;

        let requested = movie.dvdid.clone();
        let id = normalize(&requested);
        info!(
            id = %movie.dvdid,
            query_key = %id.query_key,
            franchise = id.is_franchise,
            "Resolving movie"
        );

        match self.builder.run(&id.query_key).await {
            BuildOutcome::Built { .. } => {
                debug!(builder = self.builder.name(), "Cache builder finished")
            }
            BuildOutcome::Failed { reason } => {
                warn!(builder = self.builder.name(), reason = %reason, "Cache builder failed, continuing")
            }
            BuildOutcome::Skipped { reason } => {
                debug!(builder = self.builder.name(), reason = %reason, "Cache builder skipped")
            }
        }

        let snapshots = match self.store.list_candidates(&id.query_key) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(dir = %self.store.dir().display(), error = %e, "Failed to list cache, ignoring it");
                Vec::new()
            }
        };
        debug!(count = snapshots.len(), "Cached detail snapshots");

        let purge_owed = !snapshots.is_empty();
        if purge_owed {
            self.fill_from_cache(&snapshots, &id, movie).await;
            if movie.has_title() {
                info!(id = %movie.dvdid, "Resolved from cache");
                self.store.purge_all();
                return Ok(());
            }
            debug!("Snapshots present but unusable, falling back to online lookup");
        }

        let result = self.fill_online(&id, &requested, movie).await;
        if purge_owed {
            self.store.purge_all();
        }
        if result.is_ok() {
            info!(id = %movie.dvdid, url = %movie.url, "Resolved online");
        }
        result
    }

    async fn fill_from_cache(&self, snapshots: &[SnapshotRef], id: &NormalizedId, movie: &mut MovieInfo) {
        let mut pages: Vec<(String, std::result::Result<String, ParseError>)> =
            Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            pages.push((snapshot.file_name.clone(), snapshot.read().await));
        }
        apply_best_snapshot(pages, id, movie);
    }

    async fn fill_online(
        &self,
        id: &NormalizedId,
        requested: &str,
        movie: &mut MovieInfo,
    ) -> Result<()> {
        let search_url = self.config.search_url(&id.query_key);
        debug!(url = %search_url, "Fetching search page");
        let search_html = self.fetcher.fetch_html(&search_url).await?;

        let results = SearchResults::parse(&Document::parse(&search_html));
        let Some(href) = results.find(&id.query_key) else {
            return Err(ScrapeError::NotFound {
                id: requested.to_string(),
                candidates: results.ids,
            });
        };

        let detail_url = self.detail_url(href);
        debug!(url = %detail_url, "Fetching detail page");
        let detail_html = self.fetcher.fetch_html(&detail_url).await?;

        let fields = extract(&Document::parse(&detail_html));
        fields.apply_to(movie, id.is_franchise);
        Ok(())
    }

    /// Absolute detail URL with the locale rewrite applied.
    fn detail_url(&self, href: &str) -> String {
        let href = href.trim();
        let absolute = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            Url::parse(&self.config.base_url)
                .and_then(|base| base.join(href))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{}{}", self.config.base_url, href))
        };

        match &self.config.locale_rewrite {
            Some((from, to)) => absolute.replacen(from.as_str(), to, 1),
            None => absolute,
        }
    }
}

/// Parse the snapshots, select one and write its fields into `movie`.
fn apply_best_snapshot(
    pages: Vec<(String, std::result::Result<String, ParseError>)>,
    id: &NormalizedId,
    movie: &mut MovieInfo,
) {
    let candidates = pages.into_iter().map(|(name, markup)| Candidate {
        name,
        document: markup.map(|m| Document::parse(&m)),
    });

    if let Some(selection) = select_best(candidates, &id.comparison_key()) {
        debug!(
            snapshot = %selection.name,
            exact = selection.exact,
            "Extracting from cached snapshot"
        );
        extract(&selection.document).apply_to(movie, id.is_franchise);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NoopCacheBuilder;
    use crate::testing::MockFetcher;

    fn resolver(base: &str) -> Resolver<MockFetcher, NoopCacheBuilder> {
        let tmp = std::env::temp_dir().join("missav-resolver-unit");
        let config = ScraperConfig::new()
            .with_base_url(base)
            .with_cache_dir(tmp)
            .with_prefer_env_proxy(false);
        Resolver::new(config, MockFetcher::new(), NoopCacheBuilder)
    }

    #[test]
    fn test_detail_url_relative_and_locale_rewrite() {
        let r = resolver("https://missav.ai");
        assert_eq!(r.detail_url("/ja/abp-123"), "https://missav.ai/ja/abp-123");
        assert_eq!(r.detail_url("/tw/abp-123"), "https://missav.ai/cn/abp-123");
        assert_eq!(
            r.detail_url("https://missav.ai/tw/x/tw/y"),
            "https://missav.ai/cn/x/tw/y"
        );
    }

    #[test]
    fn test_detail_url_without_rewrite() {
        let mut r = resolver("https://missav.ai");
        r.config.locale_rewrite = None;
        assert_eq!(r.detail_url("/tw/abp-123"), "https://missav.ai/tw/abp-123");
    }
}
