use crate::error::{HubError, Result};
use crate::registry::{SourcePipeline, SourceRegistry};
use crate::resolver::{Resolution, VersionResolver};
use crate::run::{UpdateOutcome, UpdateRun};
use crate::step::{StepExecutor, StepOutcome};
use crate::version::VersionSpec;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Default safety bound on steps per run.
pub const DEFAULT_MAX_CYCLES: u32 = 10;

/// Options for one update run.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub target: VersionSpec,
    /// Safety bound against flapping remote state, not a correctness
    /// mechanism; hitting it is a warning, not an error.
    pub max_cycles: u32,
    /// Return the resolved path without executing it.
    pub dry: bool,
    /// Forwarded to the dump layer's fetch.
    pub force: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            target: VersionSpec::Latest,
            max_cycles: DEFAULT_MAX_CYCLES,
            dry: false,
            force: false,
        }
    }
}

impl UpdateOptions {
    pub fn target(mut self, target: VersionSpec) -> Self {
        self.target = target;
        self
    }

    pub fn max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Drives the incremental multi-step update of a single source: resolve
/// the version path once, then alternate download/ingest steps until the
/// path is exhausted, a step fails, or the cycle limit is reached.
pub struct UpdateOrchestrator {
    registry: Arc<SourceRegistry>,
}

impl UpdateOrchestrator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Schedule an update run and return its handle immediately.
    ///
    /// The run progresses on the runtime whether or not the handle is
    /// awaited; aborting the handle cancels between awaits. A step
    /// cancelled mid-ingest may leave the backend partially updated and
    /// requires a manual check/download/apply retry.
    pub fn run_update(
        &self,
        source: &str,
        options: UpdateOptions,
    ) -> Result<JoinHandle<Result<UpdateOutcome>>> {
        let pipeline = self.registry.get(source)?;
        Ok(tokio::spawn(async move {
            Self::drive(pipeline, options).await
        }))
    }

    /// Convenience wrapper: schedule a run and await its outcome.
    pub async fn update(&self, source: &str, options: UpdateOptions) -> Result<UpdateOutcome> {
        let handle = self.run_update(source, options)?;
        handle
            .await
            .map_err(|e| HubError::Other(anyhow::anyhow!("update run panicked: {}", e)))?
    }

    async fn drive(
        pipeline: Arc<SourcePipeline>,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let source = pipeline.source().name.clone();
        let mut run = UpdateRun::new(source.clone(), options.target.clone());
        info!(
            run_id = %run.id,
            source = %source,
            target = %options.target,
            "Starting update run"
        );

        let installed = pipeline.installed_version().await?;
        let resolver = VersionResolver::new(pipeline.dump().clone());
        let resolution = match resolver
            .resolve(&source, &options.target, installed.as_ref())
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => {
                error!(run_id = %run.id, source = %source, error = %e, "Resolution failed");
                run.abort(e.to_string())?;
                return Err(e);
            }
        };

        let path = match resolution {
            Resolution::UpToDate { version } => {
                info!(run_id = %run.id, source = %source, version = %version, "Already up to date");
                let outcome = UpdateOutcome::UpToDate { version };
                run.finish(outcome.clone())?;
                return Ok(outcome);
            }
            Resolution::NoPath => {
                info!(run_id = %run.id, source = %source, "No update path found");
                run.finish(UpdateOutcome::PathUnavailable)?;
                return Ok(UpdateOutcome::PathUnavailable);
            }
            Resolution::Path(path) => path,
        };

        if options.dry {
            let versions = path.into_versions();
            let outcome = UpdateOutcome::DryRun { path: versions };
            run.finish(outcome.clone())?;
            return Ok(outcome);
        }

        let executor = StepExecutor::new(pipeline.dump().clone(), pipeline.upload().clone());
        let versions = path.versions().to_vec();
        run.start_stepping(path)?;

        let mut steps = 0usize;
        for (idx, version) in versions.iter().enumerate() {
            match executor.apply_step(&source, version, options.force).await {
                Ok(StepOutcome::Applied) => {
                    steps = run.record_step()?;
                    if steps as u32 >= options.max_cycles && idx + 1 < versions.len() {
                        let remaining = versions[idx + 1..].to_vec();
                        warn!(
                            run_id = %run.id,
                            source = %source,
                            steps,
                            remaining = remaining.len(),
                            "Cycle limit reached, stopping with path elements left"
                        );
                        let outcome = UpdateOutcome::CycleLimitReached { steps, remaining };
                        run.finish(outcome.clone())?;
                        return Ok(outcome);
                    }
                }
                Ok(StepOutcome::NothingToDump) => {
                    info!(
                        run_id = %run.id,
                        source = %source,
                        version = %version,
                        steps,
                        "Remote exhausted, stopping early"
                    );
                    let outcome = UpdateOutcome::Exhausted { steps };
                    run.finish(outcome.clone())?;
                    return Ok(outcome);
                }
                Err(e) => {
                    error!(
                        run_id = %run.id,
                        source = %source,
                        version = %version,
                        error = %e,
                        "Step failed, aborting run"
                    );
                    run.abort(e.to_string())?;
                    return Err(e);
                }
            }
        }

        let final_version = match versions.last() {
            Some(v) => v.clone(),
            None => {
                run.finish(UpdateOutcome::PathUnavailable)?;
                return Ok(UpdateOutcome::PathUnavailable);
            }
        };
        info!(
            run_id = %run.id,
            source = %source,
            steps,
            version = %final_version,
            "Update run completed, backend up to date"
        );
        let outcome = UpdateOutcome::Applied {
            steps,
            version: final_version,
        };
        run.finish(outcome.clone())?;
        Ok(outcome)
    }
}
