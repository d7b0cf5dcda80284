//! Catalog identifier to metadata resolution for a single video site.
//!
//! Given an identifier such as `ABP-123C` or `FC2-1234567`, the [`Resolver`]
//! normalizes it, pre-warms an on-disk cache of page snapshots, extracts the
//! record from the best cached detail page and falls back to searching the
//! live site when the cache has nothing usable.
//!
//! # Usage
//!
//! ```rust,ignore
//! use missav_scraper::{
//!     HttpFetcher, InProcessCacheBuilder, Resolver, ScraperConfig, SnapshotBuilder,
//! };
//!
//! let config = ScraperConfig::from_env()?;
//! let builder = InProcessCacheBuilder::new(SnapshotBuilder::with_default_backends(config.clone())?);
//! let resolver = Resolver::new(config.clone(), HttpFetcher::new(&config)?, builder);
//!
//! let movie = resolver.resolve_id("082713-417").await?;
//! println!("{}", movie.title);
//! ```
//!
//! # Modules
//!
//! - [`identifier`] - Query-key and comparison-key normalization
//! - [`cache`] - Snapshot naming, listing and purge
//! - [`extract`] - Field extraction from detail and search pages
//! - [`selector`] - Best-match choice among cached pages
//! - [`fetchers`] - HTTP and headless-browser page fetchers
//! - [`builder`] - Snapshot cache builder and `CacheBuilder` runners
//! - [`resolver`] - The resolution pipeline
//! - [`testing`] - Mock fetcher and cache builder

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetchers;
pub mod identifier;
pub mod resolver;
pub mod selector;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use builder::{
    InProcessCacheBuilder, NoopCacheBuilder, ProcessCacheBuilder, SnapshotBuilder, SnapshotPair,
};
pub use cache::{CacheStore, SnapshotKind, SnapshotRef};
pub use config::ScraperConfig;
pub use error::{FetchError, FetchResult, ParseError, Result, ScrapeError};
pub use extract::{extract, Document, SearchResults};
pub use fetchers::{ChromeFetcher, HttpFetcher};
pub use identifier::{normalize, NormalizedId};
pub use resolver::Resolver;
pub use traits::{
    cache_builder::{BuildOutcome, CacheBuilder},
    fetcher::PageFetcher,
};
pub use types::{MovieInfo, RawFields};
