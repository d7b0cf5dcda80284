use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{ScraperConfig, USER_AGENT};
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::PageFetcher;

/// Virtual time Chrome lets the page run before dumping the DOM, enough for
/// a challenge redirect and lazy-loaded result cards.
const VIRTUAL_TIME_BUDGET_MS: u64 = 3000;

/// Headless Chrome fetcher using `--dump-dom`.
///
/// Each fetch launches a fresh browser with a throw-away profile.
pub struct ChromeFetcher {
    chrome_bin: String,
    proxy: Option<String>,
    timeout: Duration,
}

impl ChromeFetcher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            chrome_bin: config.chrome_bin.clone(),
            proxy: config.effective_proxy(),
            timeout: config.browser_timeout,
        }
    }

    fn args(&self, url: &str, profile_dir: &std::path::Path) -> Vec<String> {
        let mut args = vec![
            "--headless".to_string(),
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--lang=ja-JP".to_string(),
            format!("--user-agent={USER_AGENT}"),
            format!("--user-data-dir={}", profile_dir.display()),
            format!("--virtual-time-budget={VIRTUAL_TIME_BUDGET_MS}"),
        ];
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={proxy}"));
        }
        args.push("--dump-dom".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        info!(url = %url, fetcher = "chrome", "Fetching page");
        let profile_dir = tempfile::tempdir()?;

        let run = tokio::process::Command::new(&self.chrome_bin)
            .args(self.args(url, profile_dir.path()))
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::BackendUnavailable {
                    backend: "chrome".to_string(),
                    reason: format!("{} not found", self.chrome_bin),
                });
            }
            Ok(Err(e)) => {
                return Err(FetchError::Browser {
                    reason: format!("failed to launch {}: {e}", self.chrome_bin),
                });
            }
            Err(_) => {
                warn!(url = %url, "Chrome timed out");
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url = %url, fetcher = "chrome", stderr = %stderr, "Chrome exited with error");
            return Err(FetchError::Browser {
                reason: format!("chrome exited with {}", output.status),
            });
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            warn!(url = %url, fetcher = "chrome", "Empty DOM output");
            return Err(FetchError::Browser {
                reason: format!("empty DOM for {url}"),
            });
        }

        info!(url = %url, fetcher = "chrome", bytes = html.len(), "Fetched successfully");
        Ok(html)
    }

    fn name(&self) -> &str {
        "chrome"
    }
}
