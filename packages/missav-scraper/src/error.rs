//! Typed errors for the scraper library.
//!
//! Uses `thiserror` for library errors; the binaries wrap these in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving an identifier.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or browser failure during the online path
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The query key is absent from the search results
    #[error("movie not found: {id} (search returned {candidates:?})")]
    NotFound { id: String, candidates: Vec<String> },

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised by page fetch backends.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Headless browser ran but produced no usable page
    #[error("browser error: {reason}")]
    Browser { reason: String },

    /// Backend cannot run in this environment (binary missing, etc.)
    #[error("{backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// Request or browser run exceeded its time budget
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// URL could not be parsed or is not http(s)
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Search page had no link to a detail page for the keyword
    #[error("no detail link found for: {keyword}")]
    NoTargetLink { keyword: String },

    /// Every configured backend failed
    #[error("all backends failed for: {keyword}")]
    AllBackendsFailed { keyword: String },

    /// Local filesystem failure (writing snapshots, temp profiles)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A cached snapshot that cannot be turned into a document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("snapshot is empty: {}", path.display())]
    Empty { path: PathBuf },

    #[error("failed to read snapshot {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
