//! Library entry point: turn a run request into a finished workflow and a
//! report on disk.

use crate::config::Config;
use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::llm::{TextGenerator, create_generator};
use crate::observability::{Observer, create_observer};
use crate::policy::{Clock, SystemClock};
use crate::report::ReportStore;
use crate::retrieval::{LocalRetriever, Retriever};
use crate::sources::{DiffSource, ExecutorLogSource, GitDiffSource, LogSource};
use crate::stages::{PolicySource, StageContext, standard_stages};
use crate::workflow::{Incident, Severity, Workflow, WorkflowState};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub service: String,
    pub approve: bool,
    /// Optional file holding a diff to review instead of asking git
    pub diff_path: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            approve: false,
            diff_path: None,
        }
    }

    pub fn approve(mut self, approve: bool) -> Self {
        self.approve = approve;
        self
    }

    pub fn diff_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.diff_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub incident_id: String,
    pub report_path: PathBuf,
    pub state: WorkflowState,
}

/// External collaborators for a run. Swap any of them out for tests or
/// alternative backends.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn TextGenerator>,
    pub retriever: Arc<dyn Retriever>,
    pub log_source: Arc<dyn LogSource>,
    pub diff_source: Arc<dyn DiffSource>,
    pub clock: Arc<dyn Clock>,
    pub observer: Arc<dyn Observer>,
}

impl Collaborators {
    /// Production wiring from config. The retrieval index is built from the
    /// configured corpus directories; an unreadable corpus leaves it empty.
    pub async fn from_config(config: &Config, executor: Arc<CommandExecutor>) -> Self {
        let retriever = match LocalRetriever::load(&config.retrieval.corpus_dirs).await {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "failed to build retrieval index, continuing without one");
                LocalRetriever::from_documents(Vec::<(String, String)>::new())
            }
        };

        Self {
            generator: create_generator(&config.llm),
            retriever: Arc::new(retriever),
            log_source: Arc::new(
                ExecutorLogSource::new(config.triage.clone()).with_timeout(executor.timeout()),
            ),
            diff_source: Arc::new(GitDiffSource::new(&config.git)),
            clock: Arc::new(SystemClock),
            observer: Arc::from(create_observer(&config.observability)),
        }
    }
}

pub struct Runner {
    workflow: Workflow,
    reports: ReportStore,
}

impl Runner {
    pub fn new(
        config: &Config,
        executor: Arc<CommandExecutor>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let reports = ReportStore::new(&config.incident_dir);
        let ctx = StageContext {
            generator: collaborators.generator,
            retriever: collaborators.retriever,
            log_source: collaborators.log_source,
            diff_source: collaborators.diff_source,
            executor,
            reports: reports.clone(),
            policy: PolicySource::File(config.policy_path.clone()),
            clock: collaborators.clock,
            runbook: config.runbook.clone(),
            triage: config.triage.clone(),
            top_k: config.retrieval.top_k,
        };

        let workflow = standard_stages(&ctx)
            .into_iter()
            .fold(Workflow::builder(config.workflow.clone()), |b, stage| {
                b.boxed_stage(stage)
            })
            .observer(collaborators.observer)
            .build()?;

        Ok(Self { workflow, reports })
    }

    /// Production runner: executor and collaborators built from `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let executor = Arc::new(CommandExecutor::from_config(&config.executor));
        let collaborators = Collaborators::from_config(config, executor.clone()).await;
        Self::new(config, executor, collaborators)
    }

    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome> {
        let started_at = Utc::now();
        let incident = Incident {
            id: new_incident_id(started_at),
            service: request.service,
            started_at,
            severity: Severity::P2,
        };
        info!(
            incident = %incident.id,
            service = %incident.service,
            approve = request.approve,
            "incident run starting"
        );

        let mut state = WorkflowState::new(incident, request.approve);
        if let Some(path) = &request.diff_path
            && let Some(diff) = read_diff(path).await
        {
            state = state.with_diff(diff);
        }

        let state = self.workflow.run(state).await?;
        let incident_id = state.incident.id.clone();
        Ok(RunOutcome {
            report_path: self.reports.path_for(&incident_id),
            incident_id,
            state,
        })
    }
}

/// `INC-<YYYYMMDD>-<HHMMSS>-<4 hex>`
pub fn new_incident_id(started_at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("INC-{}-{}", started_at.format("%Y%m%d-%H%M%S"), &suffix[..4])
}

async fn read_diff(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(diff) => Some(diff),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "diff file unreadable, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn incident_id_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 7).unwrap();
        let id = new_incident_id(at);
        assert!(id.starts_with("INC-20240115-090507-"), "{id}");
        let suffix = id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn request_builder() {
        let req = RunRequest::new("toy-web").approve(true).diff_path("d.patch");
        assert!(req.approve);
        assert_eq!(req.diff_path, Some(PathBuf::from("d.patch")));
    }

    #[tokio::test]
    async fn missing_diff_file_is_ignored() {
        assert!(read_diff(Path::new("/nonexistent/diff.patch")).await.is_none());
    }
}
