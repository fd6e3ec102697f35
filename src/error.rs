use thiserror::Error;

use crate::workflow::StageId;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `OpsBridge`.
///
/// Only failures that end a run surface here. Command failures, policy
/// violations and collaborator outages are recorded in the workflow state
/// instead; collaborator traits keep using `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum OpsError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Workflow wiring ──────────────────────────────────────────────────
    #[error("workflow: {0}")]
    Workflow(#[from] WorkflowError),

    // ── Report persistence ───────────────────────────────────────────────
    #[error("report: {0}")]
    Report(#[from] ReportError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Workflow errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no implementation registered for stage {0}")]
    MissingStage(StageId),

    #[error("stage {0} registered twice")]
    DuplicateStage(StageId),

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("run exceeded {limit} stage visits without reaching the end")]
    StepLimitExceeded { limit: usize },

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: Box<OpsError>,
    },
}

// ─── Report errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = OpsError> = std::result::Result<T, E>;
