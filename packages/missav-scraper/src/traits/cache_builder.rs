//! Cache builder trait.
//!
//! The resolver pre-warms the snapshot cache before reading it. Building is
//! opportunistic: whatever happens is reported as a [`BuildOutcome`] and
//! never fails the resolution.

use async_trait::async_trait;
use std::fmt;

/// What a cache build attempt achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A detail snapshot was written. The target page is known when the
    /// builder reports it.
    Built { target_url: Option<String> },
    /// The builder ran and gave up.
    Failed { reason: String },
    /// The builder could not run at all (not installed, disabled).
    Skipped { reason: String },
}

impl BuildOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, BuildOutcome::Built { .. })
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Built {
                target_url: Some(url),
            } => write!(f, "built from {url}"),
            BuildOutcome::Built { target_url: None } => write!(f, "built"),
            BuildOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            BuildOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Populates the snapshot cache for a normalized query key.
#[async_trait]
pub trait CacheBuilder: Send + Sync {
    /// Run one build for `query_key`, blocking until it finishes.
    async fn run(&self, query_key: &str) -> BuildOutcome;

    fn name(&self) -> &str;
}

#[async_trait]
impl<T: CacheBuilder + ?Sized> CacheBuilder for Box<T> {
    async fn run(&self, query_key: &str) -> BuildOutcome {
        (**self).run(query_key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
