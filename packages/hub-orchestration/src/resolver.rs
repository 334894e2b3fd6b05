use crate::capability::DumpManager;
use crate::error::Result;
use crate::version::{Version, VersionPath, VersionSpec};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of path resolution. Both empty outcomes are normal,
/// non-error results; they are kept distinct so the orchestrator can
/// report "already up to date" and "no update path found" separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The installed version already equals the target.
    UpToDate { version: Version },
    /// The dump layer could not determine any path to the target.
    NoPath,
    /// Ordered steps from just-after the installed version through the
    /// target.
    Path(VersionPath),
}

/// Computes the version path for one update run.
///
/// Path computation itself is delegated to the dump capability, which
/// knows the source's versioning scheme; the resolver owns the policy of
/// what an empty or equal result means. Pure apart from the one remote
/// probe needed to concretize `latest`.
pub struct VersionResolver {
    dump: Arc<dyn DumpManager>,
}

impl VersionResolver {
    pub fn new(dump: Arc<dyn DumpManager>) -> Self {
        Self { dump }
    }

    pub async fn resolve(
        &self,
        source: &str,
        target: &VersionSpec,
        installed: Option<&Version>,
    ) -> Result<Resolution> {
        let target = match target {
            VersionSpec::Exact(v) => v.clone(),
            VersionSpec::Latest => {
                let latest = self.dump.probe_latest(source).await?;
                debug!(source, latest = %latest, "Concretized 'latest' target");
                latest
            }
        };

        if installed == Some(&target) {
            return Ok(Resolution::UpToDate { version: target });
        }

        let steps = self
            .dump
            .compute_update_path(source, &target, installed)
            .await?;
        if steps.is_empty() {
            info!(source, target = %target, "No update path found");
            return Ok(Resolution::NoPath);
        }

        let path = VersionPath::new(steps);
        info!(
            source,
            installed = installed.map(|v| v.as_str()).unwrap_or("none"),
            target = %target,
            path = %path,
            "Found update path"
        );
        Ok(Resolution::Path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{FetchOptions, FetchResult, SourceInfo};
    use crate::error::HubError;
    use async_trait::async_trait;

    struct FakeDump {
        latest: Version,
        path: Vec<Version>,
    }

    #[async_trait]
    impl DumpManager for FakeDump {
        async fn probe_latest(&self, _source: &str) -> crate::error::Result<Version> {
            Ok(self.latest.clone())
        }

        async fn compute_update_path(
            &self,
            _source: &str,
            _target: &Version,
            _from: Option<&Version>,
        ) -> crate::error::Result<Vec<Version>> {
            Ok(self.path.clone())
        }

        async fn fetch(
            &self,
            _source: &str,
            _version: &Version,
            _opts: FetchOptions,
        ) -> crate::error::Result<FetchResult> {
            Err(HubError::Dump("fetch not expected in resolver tests".into()))
        }

        async fn remote_versions(&self, _source: &str) -> crate::error::Result<Vec<Version>> {
            Ok(vec![self.latest.clone()])
        }

        async fn info(&self, source: &str) -> crate::error::Result<SourceInfo> {
            Ok(SourceInfo {
                source: source.to_string(),
                url: String::new(),
                latest: Some(self.latest.clone()),
                release_date: None,
            })
        }
    }

    #[tokio::test]
    async fn test_latest_equal_to_installed_is_up_to_date() {
        let dump = Arc::new(FakeDump {
            latest: "v1".into(),
            path: vec!["v1".into()],
        });
        let resolver = VersionResolver::new(dump);

        let installed = Version::from("v1");
        let res = resolver
            .resolve("demo", &VersionSpec::Latest, Some(&installed))
            .await
            .unwrap();
        assert_eq!(
            res,
            Resolution::UpToDate {
                version: "v1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_path_is_no_path() {
        let dump = Arc::new(FakeDump {
            latest: "v4".into(),
            path: vec![],
        });
        let resolver = VersionResolver::new(dump);

        let installed = Version::from("v1");
        let res = resolver
            .resolve("demo", &VersionSpec::Latest, Some(&installed))
            .await
            .unwrap();
        assert_eq!(res, Resolution::NoPath);
    }

    #[tokio::test]
    async fn test_path_returned_in_order() {
        let dump = Arc::new(FakeDump {
            latest: "v4".into(),
            path: vec!["v2".into(), "v3".into(), "v4".into()],
        });
        let resolver = VersionResolver::new(dump);

        let installed = Version::from("v1");
        let res = resolver
            .resolve("demo", &VersionSpec::Latest, Some(&installed))
            .await
            .unwrap();
        match res {
            Resolution::Path(path) => {
                assert_eq!(path.len(), 3);
                assert_eq!(path.versions()[0], "v2".into());
                assert_eq!(path.last(), Some(&"v4".into()));
            }
            other => panic!("Expected Path, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exact_target_skips_probe() {
        // Probe would return v9; an exact target must not consult it.
        let dump = Arc::new(FakeDump {
            latest: "v9".into(),
            path: vec![],
        });
        let resolver = VersionResolver::new(dump);

        let installed = Version::from("v2");
        let res = resolver
            .resolve(
                "demo",
                &VersionSpec::Exact("v2".into()),
                Some(&installed),
            )
            .await
            .unwrap();
        assert_eq!(
            res,
            Resolution::UpToDate {
                version: "v2".into()
            }
        );
    }

    #[tokio::test]
    async fn test_never_installed_backend() {
        let dump = Arc::new(FakeDump {
            latest: "v2".into(),
            path: vec!["v1".into(), "v2".into()],
        });
        let resolver = VersionResolver::new(dump);

        let res = resolver
            .resolve("demo", &VersionSpec::Latest, None)
            .await
            .unwrap();
        match res {
            Resolution::Path(path) => assert_eq!(path.len(), 2),
            other => panic!("Expected Path, got {:?}", other),
        }
    }
}
