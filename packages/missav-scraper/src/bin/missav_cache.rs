//! Standalone snapshot cache builder.
//!
//! Saves the search page and the matching detail page for a keyword into the
//! cache directory. Called by the resolver's process builder with the query
//! key as its only argument; prompts for a keyword when run by hand without
//! one. Prints the detail URL on stdout when it succeeds.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Input;
use missav_scraper::cache::RUN_LOG_FILE;
use missav_scraper::{ScraperConfig, SnapshotBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "missav-cache")]
#[command(about = "Cache the search and detail pages for a keyword")]
struct Cli {
    /// Keyword to search for (prompted when omitted)
    keyword: Option<String>,

    /// Snapshot cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Proxy for the HTTP client and the browser
    #[arg(long)]
    proxy: Option<String>,

    /// Ignore HTTP(S)_PROXY from the environment
    #[arg(long)]
    no_env_proxy: bool,

    /// Site root
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ScraperConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(proxy) = cli.proxy {
        config = config.with_proxy(proxy);
    }
    if cli.no_env_proxy {
        config = config.with_prefer_env_proxy(false);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    std::fs::create_dir_all(&config.cache_dir)
        .with_context(|| format!("Failed to create {}", config.cache_dir.display()))?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.cache_dir.join(RUN_LOG_FILE))
        .context("Failed to open run log")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,missav_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let keyword = match cli.keyword.map(|k| k.trim().to_string()) {
        Some(k) if !k.is_empty() => {
            tracing::info!(keyword = %k, "Keyword from command line");
            k
        }
        _ => Input::<String>::new()
            .with_prompt("Search keyword (e.g. zuko-118)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read keyword")?
            .trim()
            .to_string(),
    };
    if keyword.is_empty() {
        anyhow::bail!("No keyword given");
    }

    if let Some(proxy) = config.effective_proxy() {
        tracing::info!(proxy = %proxy, "Using proxy");
    } else {
        tracing::info!("No proxy configured");
    }

    let builder = SnapshotBuilder::with_default_backends(config.clone())
        .context("Failed to set up backends")?;
    let pair = builder
        .build(&keyword)
        .await
        .with_context(|| format!("Could not cache detail page for {keyword}"))?;

    tracing::info!(
        target_url = %pair.target_url,
        cache_dir = %config.cache_dir.display(),
        "Done"
    );
    println!("{}", pair.target_url);
    Ok(())
}
