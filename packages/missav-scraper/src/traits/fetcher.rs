//! Page fetcher trait.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Fetches the HTML of a single page.
///
/// Implementations own their transport concerns (proxy, headers, timeouts).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the page markup.
    async fn fetch_html(&self, url: &str) -> FetchResult<String>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Box<T> {
    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        (**self).fetch_html(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
