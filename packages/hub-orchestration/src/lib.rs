/*
 * Hub Orchestration - incremental data hub updates
 *
 * Discovers and registers one pipeline per configured data source, and
 * drives the incremental multi-step update of a single source from its
 * currently installed version to a target version.
 *
 * The surrounding hub framework (job scheduling, dump/upload execution,
 * search-index backends, SSH/REST shells) is an external collaborator;
 * it plugs in through the capability traits in `capability`.
 */

pub mod capability;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod run;
pub mod source;
pub mod step;
pub mod version;

pub use capability::{Backend, DumpManager, FetchOptions, FetchResult, SourceInfo, UploadManager};
pub use commands::{CommandDispatcher, CommandOutput, HubCommand};
pub use config::HubConfig;
pub use error::{HubError, Result};
pub use orchestrator::{UpdateOptions, UpdateOrchestrator, DEFAULT_MAX_CYCLES};
pub use registry::{SourcePipeline, SourceRegistry};
pub use resolver::{Resolution, VersionResolver};
pub use run::{RunState, UpdateOutcome, UpdateRun};
pub use source::{
    derive_index_name, derive_index_suffix, folder_name_from_url, Source, SourceConfig,
};
pub use step::{StepExecutor, StepOutcome};
pub use version::{Version, VersionPath, VersionSpec};
