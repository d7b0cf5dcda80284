//! Core trait abstractions.
//!
//! - [`fetcher::PageFetcher`] - fetch one page's HTML (HTTP client, headless browser)
//! - [`cache_builder::CacheBuilder`] - pre-warm the snapshot cache for a key

pub mod cache_builder;
pub mod fetcher;
