use crate::capability::{Backend, DumpManager, UploadManager};
use crate::error::{HubError, Result};
use crate::source::{Source, SourceConfig};
use crate::version::Version;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// One registered pipeline: a source bound to the shared dump/upload
/// capabilities and its backend index. Immutable after registration;
/// re-registration replaces the whole entry.
pub struct SourcePipeline {
    source: Source,
    dump: Arc<dyn DumpManager>,
    upload: Arc<dyn UploadManager>,
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for SourcePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePipeline")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SourcePipeline {
    pub fn new(
        source: Source,
        dump: Arc<dyn DumpManager>,
        upload: Arc<dyn UploadManager>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            source,
            dump,
            upload,
            backend,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn dump(&self) -> &Arc<dyn DumpManager> {
        &self.dump
    }

    pub fn upload(&self) -> &Arc<dyn UploadManager> {
        &self.upload
    }

    /// Read-through to the backend's installed-version metadata for this
    /// pipeline's index.
    pub async fn installed_version(&self) -> Result<Option<Version>> {
        self.backend
            .installed_version(&self.source.index_name)
            .await
    }
}

/// Registry of per-source pipelines, built once at startup from
/// configuration. Concurrent reads from in-flight update runs are fine;
/// registration per source name is idempotent (replace, not patch).
pub struct SourceRegistry {
    base_index: String,
    dump: Arc<dyn DumpManager>,
    upload: Arc<dyn UploadManager>,
    backend: Arc<dyn Backend>,
    pipelines: DashMap<String, Arc<SourcePipeline>>,
}

impl SourceRegistry {
    pub fn new(
        base_index: impl Into<String>,
        dump: Arc<dyn DumpManager>,
        upload: Arc<dyn UploadManager>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            base_index: base_index.into(),
            dump,
            upload,
            backend,
            pipelines: DashMap::new(),
        }
    }

    /// Register pipelines for every configured source.
    pub fn register(&self, configs: &[SourceConfig]) -> Result<()> {
        for config in configs {
            self.register_one(config)?;
        }
        Ok(())
    }

    /// Register a single source; replaces any prior pipeline with the
    /// same derived name.
    pub fn register_one(&self, config: &SourceConfig) -> Result<()> {
        let source = Source::from_config(config, &self.base_index)?;
        info!(
            source = %source.name,
            index = %source.index_name,
            url = %source.url,
            "Registering source pipeline"
        );

        let pipeline = Arc::new(SourcePipeline::new(
            source.clone(),
            self.dump.clone(),
            self.upload.clone(),
            self.backend.clone(),
        ));
        self.pipelines.insert(source.name, pipeline);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<SourcePipeline>> {
        self.pipelines
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HubError::SourceNotFound(name.to_string()))
    }

    /// All registered sources, sorted by name for stable output.
    pub fn list(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self
            .pipelines
            .iter()
            .map(|entry| entry.value().source().clone())
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        sources
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{FetchOptions, FetchResult, SourceInfo};
    use async_trait::async_trait;

    struct NullDump;

    #[async_trait]
    impl DumpManager for NullDump {
        async fn probe_latest(&self, _source: &str) -> Result<Version> {
            Ok("v1".into())
        }

        async fn compute_update_path(
            &self,
            _source: &str,
            _target: &Version,
            _from: Option<&Version>,
        ) -> Result<Vec<Version>> {
            Ok(vec![])
        }

        async fn fetch(
            &self,
            _source: &str,
            _version: &Version,
            _opts: FetchOptions,
        ) -> Result<FetchResult> {
            Ok(FetchResult::NothingToDump)
        }

        async fn remote_versions(&self, _source: &str) -> Result<Vec<Version>> {
            Ok(vec![])
        }

        async fn info(&self, source: &str) -> Result<SourceInfo> {
            Ok(SourceInfo {
                source: source.to_string(),
                url: String::new(),
                latest: None,
                release_date: None,
            })
        }
    }

    struct NullUpload;

    #[async_trait]
    impl UploadManager for NullUpload {
        async fn ingest(&self, _source: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NullBackend;

    #[async_trait]
    impl Backend for NullBackend {
        async fn installed_version(&self, _index: &str) -> Result<Option<Version>> {
            Ok(None)
        }
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::new(
            "hub_data",
            Arc::new(NullDump),
            Arc::new(NullUpload),
            Arc::new(NullBackend),
        )
    }

    #[test]
    fn test_register_binds_index_name() {
        let reg = registry();
        reg.register(&[
            SourceConfig::named("demo-hg38", "https://example.com/demo-hg38/versions.json"),
            SourceConfig::new("https://example.com/plain/versions.json"),
        ])
        .unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("hg38").unwrap().source().index_name, "hub_data_hg38");
        assert_eq!(reg.get("plain").unwrap().source().index_name, "hub_data");
    }

    #[test]
    fn test_reregistration_replaces() {
        let reg = registry();
        reg.register_one(&SourceConfig::named("demo", "https://a/versions.json"))
            .unwrap();
        reg.register_one(&SourceConfig::named("demo", "https://b/versions.json"))
            .unwrap();

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("demo").unwrap().source().url, "https://b/versions.json");
    }

    #[test]
    fn test_unknown_source() {
        let reg = registry();
        let err = reg.get("missing").unwrap_err();
        assert!(matches!(err, HubError::SourceNotFound(_)));
    }

    #[test]
    fn test_invalid_folder_rejected() {
        let reg = registry();
        let err = reg
            .register_one(&SourceConfig::named("a-b-c", "https://a/versions.json"))
            .unwrap_err();
        assert!(matches!(err, HubError::Config(_)));
    }

    #[test]
    fn test_list_is_sorted() {
        let reg = registry();
        reg.register(&[
            SourceConfig::named("zebra", "https://z/versions.json"),
            SourceConfig::named("alpha", "https://a/versions.json"),
        ])
        .unwrap();

        let names: Vec<String> = reg.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zebra"]);
    }
}
