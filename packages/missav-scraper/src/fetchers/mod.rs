//! Page fetcher implementations.
//!
//! - `HttpFetcher` - reqwest client dressed up as a desktop browser
//! - `ChromeFetcher` - headless Chrome `--dump-dom`, for pages behind a JS challenge

mod chrome;
mod http;

pub use chrome::ChromeFetcher;
pub use http::HttpFetcher;

pub use crate::traits::fetcher::PageFetcher;
