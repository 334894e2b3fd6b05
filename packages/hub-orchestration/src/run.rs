use crate::error::{HubError, Result};
use crate::version::{Version, VersionPath, VersionSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal result of an update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Backend already at the target version; no step attempted.
    UpToDate { version: Version },
    /// Whole path applied; backend now at `version`.
    Applied { steps: usize, version: Version },
    /// A step reported "nothing to dump"; the remote is exhausted.
    Exhausted { steps: usize },
    /// No update path could be determined for the target.
    PathUnavailable,
    /// Safety bound hit with path elements remaining; re-invoke to
    /// continue from the new installed version.
    CycleLimitReached { steps: usize, remaining: Vec<Version> },
    /// Dry run: the path a real run would execute, nothing performed.
    DryRun { path: Vec<Version> },
}

/// Update run state. Terminal states are final.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Resolving {
        started_at: DateTime<Utc>,
    },
    Stepping {
        started_at: DateTime<Utc>,
        path: VersionPath,
        steps_completed: usize,
    },
    Done {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        duration_ms: u64,
        outcome: UpdateOutcome,
    },
    Aborted {
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        error: String,
    },
}

impl RunState {
    pub fn state_name(&self) -> &'static str {
        match self {
            RunState::Resolving { .. } => "resolving",
            RunState::Stepping { .. } => "stepping",
            RunState::Done { .. } => "done",
            RunState::Aborted { .. } => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done { .. } | RunState::Aborted { .. })
    }
}

/// One update run for one source, with validated state transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRun {
    pub id: Uuid,
    pub source: String,
    pub target: VersionSpec,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateRun {
    pub fn new(source: String, target: VersionSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            state: RunState::Resolving { started_at: now },
            created_at: now,
            updated_at: now,
        }
    }

    fn invalid(&self, to: &str) -> HubError {
        HubError::InvalidStateTransition {
            from: self.state.state_name().to_string(),
            to: to.to_string(),
        }
    }

    /// Transition: RESOLVING -> STEPPING with the resolved path.
    pub fn start_stepping(&mut self, path: VersionPath) -> Result<()> {
        match &self.state {
            RunState::Resolving { started_at } => {
                self.state = RunState::Stepping {
                    started_at: *started_at,
                    path,
                    steps_completed: 0,
                };
                self.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(self.invalid("stepping")),
        }
    }

    /// Record one applied step; returns the new step count.
    pub fn record_step(&mut self) -> Result<usize> {
        match &mut self.state {
            RunState::Stepping {
                steps_completed, ..
            } => {
                *steps_completed += 1;
                let count = *steps_completed;
                self.updated_at = Utc::now();
                Ok(count)
            }
            _ => Err(self.invalid("record_step")),
        }
    }

    /// Transition: RESOLVING|STEPPING -> DONE with a terminal outcome.
    pub fn finish(&mut self, outcome: UpdateOutcome) -> Result<()> {
        let started_at = match &self.state {
            RunState::Resolving { started_at } => *started_at,
            RunState::Stepping { started_at, .. } => *started_at,
            _ => return Err(self.invalid("done")),
        };
        let now = Utc::now();
        self.state = RunState::Done {
            started_at,
            finished_at: now,
            duration_ms: (now - started_at).num_milliseconds() as u64,
            outcome,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Transition: RESOLVING|STEPPING -> ABORTED on step failure.
    pub fn abort(&mut self, error: String) -> Result<()> {
        let started_at = match &self.state {
            RunState::Resolving { started_at } => *started_at,
            RunState::Stepping { started_at, .. } => *started_at,
            _ => return Err(self.invalid("aborted")),
        };
        let now = Utc::now();
        self.state = RunState::Aborted {
            started_at,
            failed_at: now,
            error,
        };
        self.updated_at = now;
        Ok(())
    }
}
