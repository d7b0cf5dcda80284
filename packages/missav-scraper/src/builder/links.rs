//! Detail-link discovery on search pages.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::extract::Document;

static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href=["']([^"']+)["']"#).expect("valid regex"));

/// Candidate links from a search page, in priority order: anchor `href`s,
/// raw `href="…"` attributes the parser may have missed, then absolute site
/// URLs appearing anywhere in the markup.
pub fn collect_links(html: &str, site_host: &str) -> Vec<String> {
    let mut links = Document::parse(html).links();

    links.extend(HREF_ATTR.captures_iter(html).map(|cap| cap[1].to_string()));

    let absolute = format!(
        r#"(?i)https?://(?:www\.)?{}/[^\s"'<>]+"#,
        regex::escape(site_host)
    );
    if let Ok(absolute) = Regex::new(&absolute) {
        links.extend(absolute.find_iter(html).map(|m| m.as_str().to_string()));
    }

    links
}

/// First link that looks like the keyword's detail page, made absolute.
pub fn pick_first_target(links: &[String], keyword: &str, base: &Url) -> Option<String> {
    links
        .iter()
        .find_map(|href| target_link(href, keyword, base))
}

/// Absolute form of `href` if it is an on-site, non-search page whose path
/// mentions the keyword.
fn target_link(href: &str, keyword: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let url = if let Some(rest) = href.strip_prefix("//") {
        Url::parse(&format!("https://{rest}")).ok()?
    } else {
        base.join(href).ok()?
    };

    if let (Some(host), Some(site)) = (url.host_str(), base.host_str()) {
        let host = host.to_lowercase();
        let site = site.to_lowercase();
        let www_site = format!("www.{site}");
        if host != site && host != www_site {
            return None;
        }
    }

    let path = url.path().to_lowercase();
    if !path.contains(&keyword.to_lowercase()) || path.contains("/search/") {
        return None;
    }

    Some(url.to_string())
}
