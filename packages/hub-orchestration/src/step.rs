use crate::capability::{DumpManager, FetchOptions, FetchResult, UploadManager};
use crate::error::Result;
use crate::version::Version;
use std::sync::Arc;
use tracing::info;

/// Outcome of a single download-then-ingest step. Failures are the `Err`
/// arm of the surrounding `Result`; the executor never retries on its
/// own — retry policy belongs to the orchestrator's caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Downloaded and ingested; the backend's installed version now
    /// reflects this step (written by the upload layer, not by us).
    Applied,
    /// The remote had nothing to dump for this version; ingest skipped.
    NothingToDump,
}

/// Performs one "download then ingest" step for a specific version.
pub struct StepExecutor {
    dump: Arc<dyn DumpManager>,
    upload: Arc<dyn UploadManager>,
}

impl StepExecutor {
    pub fn new(dump: Arc<dyn DumpManager>, upload: Arc<dyn UploadManager>) -> Self {
        Self { dump, upload }
    }

    pub async fn apply_step(
        &self,
        source: &str,
        version: &Version,
        force: bool,
    ) -> Result<StepOutcome> {
        info!(source, version = %version, "Downloading data");
        let fetched = self
            .dump
            .fetch(
                source,
                version,
                FetchOptions {
                    check_only: false,
                    force,
                },
            )
            .await?;

        if fetched == FetchResult::NothingToDump {
            info!(source, version = %version, "Nothing to dump");
            return Ok(StepOutcome::NothingToDump);
        }

        info!(source, version = %version, "Updating backend");
        self.upload.ingest(source).await?;
        Ok(StepOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SourceInfo;
    use crate::error::HubError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedDump {
        result: FetchResult,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl DumpManager for ScriptedDump {
        async fn probe_latest(&self, _source: &str) -> Result<Version> {
            unimplemented!("not used by the executor")
        }

        async fn compute_update_path(
            &self,
            _source: &str,
            _target: &Version,
            _from: Option<&Version>,
        ) -> Result<Vec<Version>> {
            unimplemented!("not used by the executor")
        }

        async fn fetch(
            &self,
            _source: &str,
            _version: &Version,
            opts: FetchOptions,
        ) -> Result<FetchResult> {
            assert!(!opts.check_only, "executor must perform a real fetch");
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.result)
        }

        async fn remote_versions(&self, _source: &str) -> Result<Vec<Version>> {
            unimplemented!("not used by the executor")
        }

        async fn info(&self, _source: &str) -> Result<SourceInfo> {
            unimplemented!("not used by the executor")
        }
    }

    struct CountingUpload {
        ingests: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl UploadManager for CountingUpload {
        async fn ingest(&self, _source: &str) -> Result<()> {
            self.ingests.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HubError::Ingest("index write failed".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fetch_then_ingest_is_applied() {
        let dump = Arc::new(ScriptedDump {
            result: FetchResult::Fetched,
            fetches: AtomicUsize::new(0),
        });
        let upload = Arc::new(CountingUpload {
            ingests: AtomicUsize::new(0),
            fail: false,
        });
        let executor = StepExecutor::new(dump.clone(), upload.clone());

        let outcome = executor
            .apply_step("demo", &"v2".into(), false)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Applied);
        assert_eq!(dump.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(upload.ingests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_dump_skips_ingest() {
        let dump = Arc::new(ScriptedDump {
            result: FetchResult::NothingToDump,
            fetches: AtomicUsize::new(0),
        });
        let upload = Arc::new(CountingUpload {
            ingests: AtomicUsize::new(0),
            fail: false,
        });
        let executor = StepExecutor::new(dump, upload.clone());

        let outcome = executor
            .apply_step("demo", &"v2".into(), false)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::NothingToDump);
        assert_eq!(upload.ingests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_failure_propagates() {
        let dump = Arc::new(ScriptedDump {
            result: FetchResult::Fetched,
            fetches: AtomicUsize::new(0),
        });
        let upload = Arc::new(CountingUpload {
            ingests: AtomicUsize::new(0),
            fail: true,
        });
        let executor = StepExecutor::new(dump, upload.clone());

        let err = executor
            .apply_step("demo", &"v2".into(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::Ingest(_)));
        // No retry inside the executor.
        assert_eq!(upload.ingests.load(Ordering::SeqCst), 1);
    }
}
