//! `CacheBuilder` implementations.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::SnapshotBuilder;
use crate::config::ScraperConfig;
use crate::traits::cache_builder::{BuildOutcome, CacheBuilder};

/// File name of the standalone builder binary.
pub const CACHE_BUILDER_BIN: &str = "missav-cache";

/// Runs a [`SnapshotBuilder`] inside the current process.
pub struct InProcessCacheBuilder {
    builder: SnapshotBuilder,
}

impl InProcessCacheBuilder {
    pub fn new(builder: SnapshotBuilder) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl CacheBuilder for InProcessCacheBuilder {
    async fn run(&self, query_key: &str) -> BuildOutcome {
        match self.builder.build(query_key).await {
            Ok(pair) => BuildOutcome::Built {
                target_url: Some(pair.target_url),
            },
            Err(e) => BuildOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn name(&self) -> &str {
        "in-process"
    }
}

/// Runs the standalone `missav-cache` program as a blocking child job.
///
/// The query key is passed as the only argument and the cache directory via
/// `MISSAV_CACHE_DIR`. On success the program prints the detail URL as its
/// last line of stdout.
pub struct ProcessCacheBuilder {
    program: PathBuf,
    cache_dir: PathBuf,
}

impl ProcessCacheBuilder {
    pub fn new(program: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Use the configured program, or `missav-cache` next to the current
    /// executable.
    pub fn from_config(config: &ScraperConfig) -> Self {
        let program = config
            .cache_builder_bin
            .clone()
            .unwrap_or_else(sibling_builder_bin);
        Self::new(program, config.cache_dir.clone())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn sibling_builder_bin() -> PathBuf {
    let name = format!("{CACHE_BUILDER_BIN}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[async_trait]
impl CacheBuilder for ProcessCacheBuilder {
    async fn run(&self, query_key: &str) -> BuildOutcome {
        if !self.program.is_file() {
            debug!(program = %self.program.display(), "Cache builder not installed, skipping");
            return BuildOutcome::Skipped {
                reason: format!("{} not found", self.program.display()),
            };
        }

        debug!(program = %self.program.display(), query_key = %query_key, "Starting cache builder");
        let output = tokio::process::Command::new(&self.program)
            .arg(query_key)
            .env("MISSAV_CACHE_DIR", &self.cache_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let target_url = stdout
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .last()
                    .map(str::to_string);
                BuildOutcome::Built { target_url }
            }
            Ok(output) => {
                warn!(status = %output.status, "Cache builder failed");
                BuildOutcome::Failed {
                    reason: format!("exited with {}", output.status),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cache builder could not be started");
                BuildOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// Builder that never builds; the resolver then relies on existing
/// snapshots and the online path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheBuilder;

#[async_trait]
impl CacheBuilder for NoopCacheBuilder {
    async fn run(&self, _query_key: &str) -> BuildOutcome {
        BuildOutcome::Skipped {
            reason: "cache building disabled".to_string(),
        }
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let builder = ProcessCacheBuilder::new(tmp.path().join("missav-cache"), tmp.path());
        assert!(matches!(
            builder.run("ABP-123").await,
            BuildOutcome::Skipped { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_program_exit_status_and_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("builder.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"building $1 in $MISSAV_CACHE_DIR\"\necho https://missav.ai/ja/$1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let builder = ProcessCacheBuilder::new(&script, tmp.path());
        assert_eq!(
            builder.run("abp-123").await,
            BuildOutcome::Built {
                target_url: Some("https://missav.ai/ja/abp-123".to_string())
            }
        );

        let failing = tmp.path().join("fail.sh");
        std::fs::write(&failing, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&failing, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(
            ProcessCacheBuilder::new(&failing, tmp.path()).run("x").await,
            BuildOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_noop_skips() {
        assert!(!NoopCacheBuilder.run("x").await.is_built());
    }
}
