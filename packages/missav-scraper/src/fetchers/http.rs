use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::config::{ScraperConfig, ACCEPT_LANGUAGE, USER_AGENT};
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::PageFetcher;

/// HTTP fetcher with browser-like headers and a cookie jar.
///
/// Cookies persist across requests on the same fetcher, so a clearance
/// cookie set by the search page is replayed on the detail page.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            // proxy precedence is decided by the config, not reqwest's env lookup
            .no_proxy();

        if let Some(proxy) = config.effective_proxy() {
            debug!(proxy = %proxy, "HTTP fetcher using proxy");
            let proxy = reqwest::Proxy::all(&proxy).map_err(|e| FetchError::Http(Box::new(e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| FetchError::Http(Box::new(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            map_reqwest_error(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;
        debug!(url = %url, bytes = html.len(), "HTTP fetch complete");
        Ok(html)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn map_reqwest_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
        }
    } else {
        FetchError::Http(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_explicit_proxy() {
        let config = ScraperConfig::new()
            .with_proxy("http://127.0.0.1:10808")
            .with_prefer_env_proxy(false);
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let fetcher = HttpFetcher::new(&ScraperConfig::new().with_prefer_env_proxy(false)).unwrap();
        let err = fetcher.fetch_html("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
