//! Resolve one catalog identifier and print the record as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use missav_scraper::{
    CacheBuilder, HttpFetcher, InProcessCacheBuilder, NoopCacheBuilder, ProcessCacheBuilder,
    Resolver, ScrapeError, ScraperConfig, SnapshotBuilder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "missav")]
#[command(about = "Resolve a catalog identifier to a metadata record")]
struct Cli {
    /// Identifier to resolve (e.g. ABP-123, FC2-1234567)
    id: String,

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

    /// How to pre-warm the snapshot cache
    #[arg(long, value_enum, default_value_t = BuilderKind::InProcess)]
    builder: BuilderKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuilderKind {
    /// Build snapshots inside this process
    InProcess,
    /// Run the standalone missav-cache program
    Process,
    /// Do not build snapshots
    None,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,missav_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

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

    let builder: Box<dyn CacheBuilder> = match cli.builder {
        BuilderKind::InProcess => Box::new(InProcessCacheBuilder::new(
            SnapshotBuilder::with_default_backends(config.clone())
                .context("Failed to set up cache builder")?,
        )),
        BuilderKind::Process => {
            let builder = ProcessCacheBuilder::from_config(&config);
            tracing::debug!(program = %builder.program().display(), "Using external cache builder");
            Box::new(builder)
        }
        BuilderKind::None => Box::new(NoopCacheBuilder),
    };
    let fetcher = HttpFetcher::new(&config).context("Failed to create HTTP client")?;
    let resolver = Resolver::new(config, fetcher, builder);

    match resolver.resolve_id(&cli.id).await {
        Ok(movie) => {
            println!("{}", serde_json::to_string_pretty(&movie)?);
            Ok(())
        }
        Err(ScrapeError::NotFound { id, candidates }) => {
            anyhow::bail!("{id} not found; search returned: {}", candidates.join(", "))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to resolve {}", cli.id)),
    }
}
