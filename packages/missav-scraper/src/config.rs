//! Scraper configuration.
//!
//! Loaded from environment variables (and `.env` in development); binaries
//! override individual fields from command-line flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use tracing::debug;

use crate::error::ScrapeError;

pub const DEFAULT_BASE_URL: &str = "https://missav.ai";
pub const DEFAULT_LOCALE: &str = "ja";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_CHROME_BIN: &str = "chromium";

/// Desktop Chrome user agent shared by every backend.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGE: &str = "ja,en;q=0.9,zh;q=0.8";

const ENV_PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];

/// Configuration for the resolver, the fetch backends and the cache builder.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root, without trailing slash.
    pub base_url: String,

    /// Locale path segment for search URLs.
    pub locale: String,

    /// Locale segment substitution applied to detail links (first occurrence).
    pub locale_rewrite: Option<(String, String)>,

    /// Directory holding page snapshots.
    pub cache_dir: PathBuf,

    /// Explicit proxy for HTTP client and browser.
    pub proxy_url: Option<String>,

    /// Whether `HTTP(S)_PROXY` from the environment beats `proxy_url`.
    pub prefer_env_proxy: bool,

    /// Headless Chrome/Chromium executable.
    pub chrome_bin: String,

    /// Standalone cache builder program, for the subprocess builder.
    pub cache_builder_bin: Option<PathBuf>,

    pub request_timeout: Duration,
    pub browser_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            locale_rewrite: Some(("/tw/".to_string(), "/cn/".to_string())),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            proxy_url: None,
            prefer_env_proxy: true,
            chrome_bin: DEFAULT_CHROME_BIN.to_string(),
            cache_builder_bin: None,
            request_timeout: Duration::from_secs(60),
            browser_timeout: Duration::from_secs(60),
        }
    }
}

impl ScraperConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ScrapeError> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut config = Self::default();
        if let Ok(base_url) = env::var("MISSAV_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(locale) = env::var("MISSAV_LOCALE") {
            config.locale = locale;
        }
        if let Ok(dir) = env::var("MISSAV_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(proxy) = env::var("MISSAV_PROXY") {
            config.proxy_url = Some(proxy).filter(|p| !p.trim().is_empty());
        }
        if let Ok(flag) = env::var("MISSAV_PREFER_ENV_PROXY") {
            config.prefer_env_proxy = parse_bool(&flag).ok_or_else(|| {
                ScrapeError::Config(format!("MISSAV_PREFER_ENV_PROXY must be a boolean, got {flag:?}"))
            })?;
        }
        if let Ok(bin) = env::var("CHROME_BIN") {
            config.chrome_bin = bin;
        }
        if let Ok(bin) = env::var("MISSAV_CACHE_BUILDER") {
            config.cache_builder_bin = Some(PathBuf::from(bin));
        }

        url::Url::parse(&config.base_url).map_err(|e| {
            ScrapeError::Config(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;

        Ok(config)
    }

    /// Set the site root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the snapshot directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set an explicit proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy.into()).filter(|p| !p.trim().is_empty());
        self
    }

    /// Set whether environment proxies take precedence.
    pub fn with_prefer_env_proxy(mut self, prefer: bool) -> Self {
        self.prefer_env_proxy = prefer;
        self
    }

    /// Set the Chrome executable.
    pub fn with_chrome_bin(mut self, bin: impl Into<String>) -> Self {
        self.chrome_bin = bin.into();
        self
    }

    /// Set the standalone cache builder program.
    pub fn with_cache_builder_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.cache_builder_bin = Some(bin.into());
        self
    }

    /// `{base}/{locale}/search/{key}`
    pub fn search_url(&self, query_key: &str) -> String {
        format!("{}/{}/search/{}", self.base_url, self.locale, query_key)
    }

    /// Host of the site, if `base_url` parses.
    pub fn site_host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
    }

    /// Proxy to use after applying environment precedence.
    pub fn effective_proxy(&self) -> Option<String> {
        self.resolve_proxy(|name| env::var(name).ok())
    }

    fn resolve_proxy(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if self.prefer_env_proxy {
            let from_env = ENV_PROXY_VARS
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty());
            if let Some(proxy) = from_env {
                debug!(proxy = %proxy, "Using proxy from environment");
                return Some(proxy);
            }
        }
        self.proxy_url.clone()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
