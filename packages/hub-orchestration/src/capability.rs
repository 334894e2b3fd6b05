use crate::error::Result;
use crate::version::Version;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options forwarded to the dump layer on fetch.
///
/// `check_only` probes the remote without downloading (the `check` admin
/// command); `force` bypasses the dump layer's own up-to-date
/// short-circuit. Neither is interpreted by the orchestrator itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub check_only: bool,
    pub force: bool,
}

/// Outcome of a dump fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchResult {
    /// Snapshot data is downloaded and ready to ingest.
    Fetched,
    /// The remote has nothing for this version (or it is already
    /// fetched); a normal terminal condition, not an error.
    NothingToDump,
}

/// Remote metadata for the `info` admin command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source: String,
    pub url: String,
    pub latest: Option<Version>,
    pub release_date: Option<DateTime<Utc>>,
}

/// Dump capability: remote version discovery and snapshot download.
///
/// The dump layer owns the source's versioning scheme; the core delegates
/// all version comparison to it.
#[async_trait]
pub trait DumpManager: Send + Sync {
    /// Newest version available on the remote.
    async fn probe_latest(&self, source: &str) -> Result<Version>;

    /// Ordered versions needed to go from `from` (None = never installed)
    /// up to and including `target`. Empty means no path is known.
    async fn compute_update_path(
        &self,
        source: &str,
        target: &Version,
        from: Option<&Version>,
    ) -> Result<Vec<Version>>;

    /// Fetch one version's snapshot for a source.
    async fn fetch(&self, source: &str, version: &Version, opts: FetchOptions)
        -> Result<FetchResult>;

    /// All versions the remote advertises for a source.
    async fn remote_versions(&self, source: &str) -> Result<Vec<Version>>;

    /// Remote metadata for a source.
    async fn info(&self, source: &str) -> Result<SourceInfo>;
}

/// Upload capability: ingest the freshly downloaded snapshot into the
/// backend. Updates the backend's installed-version metadata as a side
/// effect of a successful ingest.
#[async_trait]
pub trait UploadManager: Send + Sync {
    async fn ingest(&self, source: &str) -> Result<()>;
}

/// Search backend, read side only: the core reads installed-version
/// metadata through here on every run and persists nothing itself.
/// Writes go exclusively through the upload capability.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn installed_version(&self, index: &str) -> Result<Option<Version>>;
}
