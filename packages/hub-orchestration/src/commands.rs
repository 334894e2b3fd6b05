use crate::capability::{FetchOptions, FetchResult, SourceInfo};
use crate::error::Result;
use crate::orchestrator::{UpdateOptions, UpdateOrchestrator};
use crate::registry::SourceRegistry;
use crate::run::UpdateOutcome;
use crate::source::Source;
use crate::version::{Version, VersionSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

fn default_version() -> String {
    "latest".to_string()
}

/// Administrative commands exposed to the shell/API layer. One uniform,
/// data-driven surface for every registered source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HubCommand {
    /// Registered sources and their remote locations.
    List,
    /// All versions the remote advertises for a source.
    Versions { source: String },
    /// Probe the remote for the latest version without downloading.
    Check { source: String },
    /// Remote metadata plus the backend's installed version.
    Info { source: String },
    /// Fetch one version's snapshot without ingesting it.
    Download { source: String, version: String },
    /// Ingest the last downloaded snapshot.
    Apply { source: String },
    /// Full incremental update up to the given version.
    Install {
        source: String,
        #[serde(default = "default_version")]
        version: String,
        #[serde(default)]
        dry: bool,
        #[serde(default)]
        force: bool,
    },
}

/// Command result payload, serializable for the API layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutput {
    Sources {
        sources: Vec<Source>,
    },
    Versions {
        source: String,
        versions: Vec<Version>,
    },
    Fetch {
        source: String,
        version: Version,
        result: FetchResult,
    },
    Info {
        info: SourceInfo,
        installed: Option<Version>,
    },
    Applied {
        source: String,
    },
    Update {
        source: String,
        outcome: UpdateOutcome,
    },
}

/// Executes administrative commands against the registry and
/// orchestrator. Failures surface as errors, never as a generic success.
pub struct CommandDispatcher {
    registry: Arc<SourceRegistry>,
    orchestrator: UpdateOrchestrator,
    max_cycles: u32,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        let orchestrator = UpdateOrchestrator::new(registry.clone());
        Self {
            registry,
            orchestrator,
            max_cycles: crate::orchestrator::DEFAULT_MAX_CYCLES,
        }
    }

    /// Override the per-run cycle limit (from `HubConfig.max_cycles`).
    pub fn max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub async fn dispatch(&self, command: HubCommand) -> Result<CommandOutput> {
        match command {
            HubCommand::List => Ok(CommandOutput::Sources {
                sources: self.registry.list(),
            }),
            HubCommand::Versions { source } => {
                let pipeline = self.registry.get(&source)?;
                let versions = pipeline.dump().remote_versions(&source).await?;
                Ok(CommandOutput::Versions { source, versions })
            }
            HubCommand::Check { source } => {
                let pipeline = self.registry.get(&source)?;
                let latest = pipeline.dump().probe_latest(&source).await?;
                let result = pipeline
                    .dump()
                    .fetch(
                        &source,
                        &latest,
                        FetchOptions {
                            check_only: true,
                            force: false,
                        },
                    )
                    .await?;
                Ok(CommandOutput::Fetch {
                    source,
                    version: latest,
                    result,
                })
            }
            HubCommand::Info { source } => {
                let pipeline = self.registry.get(&source)?;
                let info = pipeline.dump().info(&source).await?;
                let installed = pipeline.installed_version().await?;
                Ok(CommandOutput::Info { info, installed })
            }
            HubCommand::Download { source, version } => {
                let pipeline = self.registry.get(&source)?;
                let version = match VersionSpec::parse(&version) {
                    VersionSpec::Latest => pipeline.dump().probe_latest(&source).await?,
                    VersionSpec::Exact(v) => v,
                };
                let result = pipeline
                    .dump()
                    .fetch(&source, &version, FetchOptions::default())
                    .await?;
                Ok(CommandOutput::Fetch {
                    source,
                    version,
                    result,
                })
            }
            HubCommand::Apply { source } => {
                let pipeline = self.registry.get(&source)?;
                pipeline.upload().ingest(&source).await?;
                Ok(CommandOutput::Applied { source })
            }
            HubCommand::Install {
                source,
                version,
                dry,
                force,
            } => {
                info!(source = %source, version = %version, dry, force, "Install requested");
                let options = UpdateOptions::default()
                    .target(VersionSpec::parse(&version))
                    .max_cycles(self.max_cycles)
                    .dry(dry)
                    .force(force);
                let outcome = self.orchestrator.update(&source, options).await?;
                Ok(CommandOutput::Update { source, outcome })
            }
        }
    }
}
