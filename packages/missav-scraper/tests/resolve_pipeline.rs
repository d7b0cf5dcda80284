//! Integration tests for the resolution pipeline.
//!
//! These tests verify the full flow:
//! 1. Normalize and pre-warm the cache
//! 2. Resolve from cached snapshots when possible
//! 3. Fall back to search + detail pages
//! 4. Purge the cache whenever it was read

use std::path::Path;

use missav_scraper::{
    testing::{MockCacheBuilder, MockFetcher},
    BuildOutcome, FetchError, NoopCacheBuilder, Resolver, ScrapeError, ScraperConfig,
};

const BASE: &str = "https://missav.ai";

/// Helper to build a detail page.
fn detail_page(id: &str, title: &str) -> String {
    format!(
        r#"<html><head>
        <meta property="og:url" content="{BASE}/ja/{lower}">
        <meta property="og:title" content="{id} {title}">
        <meta property="og:description" content="Plot of {id}">
        <meta property="og:image" content="https://cdn.example/{lower}.jpg">
        <meta property="og:video:release_date" content="2013-08-27">
        <meta property="og:video:duration" content="3661">
        </head><body>
        <div class="text-secondary"><span>品番:</span><span class="font-medium">{id}</span></div>
        <div class="text-secondary"><span>女優:</span><a href="/a">Performer A</a><a href="/b">Performer B</a></div>
        <div class="text-secondary"><span>ジャンル:</span><a>Genre</a></div>
        <div class="text-secondary"><span>メーカー:</span><a>Maker</a></div>
        <div class="text-secondary"><span>シリーズ:</span><a>Series</a></div>
        </body></html>"#,
        lower = id.to_lowercase()
    )
}

/// Helper to build a search page with result cards.
fn search_page(ids: &[&str]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="thumbnail group"><div class="relative aspect-w-16 aspect-h-9 rounded">
                <a href="/tw/{lower}"><img alt="{id}" src="/{lower}.jpg"></a></div></div>"#,
                lower = id.to_lowercase()
            )
        })
        .collect();
    format!(r#"<html><body><div class="grid">{cards}</div></body></html>"#)
}

fn config(dir: &Path) -> ScraperConfig {
    ScraperConfig::new()
        .with_base_url(BASE)
        .with_cache_dir(dir)
        .with_prefer_env_proxy(false)
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[tokio::test]
async fn test_online_resolution_without_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new()
        .with_page(
            format!("{BASE}/ja/search/082713-417"),
            search_page(&["082713-417", "082713-999"]),
        )
        .with_page(
            format!("{BASE}/cn/082713-417"),
            detail_page("082713-417", "Online title"),
        );

    let resolver = Resolver::new(config(tmp.path()), fetcher.clone(), NoopCacheBuilder);
    let movie = resolver.resolve_id("082713-417").await.unwrap();

    assert_eq!(movie.dvdid, "082713-417");
    assert_eq!(movie.title, "Online title");
    assert_eq!(movie.duration, "61");
    assert_eq!(movie.actress, vec!["Performer A", "Performer B"]);
    assert_eq!(movie.producer, "Maker");
    assert_eq!(movie.serial, "Series");
    assert_eq!(
        fetcher.calls(),
        vec![
            format!("{BASE}/ja/search/082713-417"),
            format!("{BASE}/cn/082713-417"),
        ]
    );
}

#[tokio::test]
async fn test_franchise_resolved_from_cache_without_network() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path())
        .with_detail("FC2-PPV-1234567", detail_page("FC2-PPV-1234567", "Cached title"));
    let fetcher = MockFetcher::new();

    let resolver = Resolver::new(config(tmp.path()), fetcher.clone(), builder.clone());
    let movie = resolver.resolve_id("FC2-1234567C").await.unwrap();

    assert_eq!(builder.runs(), vec!["FC2-PPV-1234567"]);
    assert_eq!(fetcher.call_count(), 0);
    assert_eq!(movie.title, "Cached title");
    assert_eq!(movie.dvdid, "FC2-1234567");
    // franchise items map the series row to producer and leave serial empty
    assert_eq!(movie.producer, "Series");
    assert_eq!(movie.serial, "");
    assert!(tmp.path().is_dir());
    assert!(dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_not_found_carries_candidates_and_purges() {
    let tmp = tempfile::tempdir().unwrap();
    // a cached page with no title forces the online path after the cache was read
    let builder = MockCacheBuilder::new(tmp.path())
        .with_detail("ABP-123", "<html><body><p>challenge page</p></body></html>");
    let fetcher = MockFetcher::new().with_page(
        format!("{BASE}/ja/search/ABP-123"),
        search_page(&["ABP-124", "ABP-125"]),
    );

    let resolver = Resolver::new(config(tmp.path()), fetcher, builder);
    let err = resolver.resolve_id("ABP-123").await.unwrap_err();

    match err {
        ScrapeError::NotFound { id, candidates } => {
            assert_eq!(id, "ABP-123");
            assert_eq!(candidates, vec!["ABP-124", "ABP-125"]);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_empty_cached_title_falls_through_online_then_purges() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path())
        .with_detail("ABP-123", "<html><head><title>Just a moment</title></head></html>");
    let fetcher = MockFetcher::new()
        .with_page(format!("{BASE}/ja/search/ABP-123"), search_page(&["ABP-123"]))
        .with_page(format!("{BASE}/cn/abp-123"), detail_page("ABP-123", "Live title"));

    let resolver = Resolver::new(config(tmp.path()), fetcher.clone(), builder);
    let movie = resolver.resolve_id("ABP-123").await.unwrap();

    assert_eq!(movie.title, "Live title");
    assert_eq!(fetcher.call_count(), 2);
    assert!(dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_transport_failure_still_purges_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path()).with_detail("ABP-123", "   ");
    let fetcher = MockFetcher::new().failing_with_status(503);

    let resolver = Resolver::new(config(tmp.path()), fetcher, builder);
    let err = resolver.resolve_id("ABP-123").await.unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Fetch(FetchError::Status { status: 503, .. })
    ));
    assert!(dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_no_purge_when_cache_never_entered() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("OTHER-1_detail_20240101_000000.html"), "x").unwrap();
    let fetcher = MockFetcher::new().with_page(format!("{BASE}/ja/search/ABP-123"), search_page(&[]));

    let resolver = Resolver::new(config(tmp.path()), fetcher, NoopCacheBuilder);
    assert!(resolver.resolve_id("ABP-123").await.is_err());

    assert!(tmp.path().join("OTHER-1_detail_20240101_000000.html").exists());
}

#[tokio::test]
async fn test_cache_builder_failure_is_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path()).with_outcome(BuildOutcome::Failed {
        reason: "exited with 1".into(),
    });
    let fetcher = MockFetcher::new()
        .with_page(format!("{BASE}/ja/search/ABP-123"), search_page(&["ABP-123"]))
        .with_page(format!("{BASE}/cn/abp-123"), detail_page("ABP-123", "Live title"));

    let resolver = Resolver::new(config(tmp.path()), fetcher, builder);
    let movie = resolver.resolve_id("ABP-123").await.unwrap();
    assert_eq!(movie.title, "Live title");
}

#[tokio::test]
async fn test_mismatched_snapshot_used_as_fallback() {
    // Known-lossy path: the only parsable snapshot belongs to another title
    // but is still preferred over going online.
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path())
        .with_detail("ABP-123", "")
        .with_detail("ABP-123", detail_page("ABP-999", "Wrong title"));
    let fetcher = MockFetcher::new();

    let resolver = Resolver::new(config(tmp.path()), fetcher.clone(), builder);
    let movie = resolver.resolve_id("ABP-123").await.unwrap();

    assert_eq!(movie.dvdid, "ABP-999");
    assert_eq!(movie.title, "Wrong title");
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_resolving_twice_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let builder = MockCacheBuilder::new(tmp.path())
        .with_detail("SSIS-001", detail_page("SSIS-001", "Same every time"));

    let resolver = Resolver::new(config(tmp.path()), MockFetcher::new(), builder.clone());
    let first = resolver.resolve_id("SSIS-001").await.unwrap();
    assert!(dir_is_empty(tmp.path()));
    let second = resolver.resolve_id("SSIS-001").await.unwrap();
    assert!(dir_is_empty(tmp.path()));

    assert_eq!(first, second);
    assert_eq!(builder.run_count(), 2);
}

#[tokio::test]
async fn test_caller_identifier_kept_until_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new().failing_with_status(500);
    let resolver = Resolver::new(config(tmp.path()), fetcher, NoopCacheBuilder);

    let mut movie = missav_scraper::MovieInfo::new("FC2-1234567C");
    assert!(resolver.resolve(&mut movie).await.is_err());
    assert_eq!(movie.dvdid, "FC2-1234567C");
}
