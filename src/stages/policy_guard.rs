use crate::error::Result;
use crate::policy::{Clock, PolicyConfig, evaluate, load_policy};
use crate::workflow::{Approvals, Message, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Where the guard gets its policy from.
#[derive(Debug, Clone)]
pub enum PolicySource {
    /// Re-read on every evaluation so edits apply to the next run.
    File(PathBuf),
    Fixed(PolicyConfig),
}

impl PolicySource {
    pub fn resolve(&self) -> PolicyConfig {
        match self {
            Self::File(path) => load_policy(path),
            Self::Fixed(policy) => policy.clone(),
        }
    }
}

pub struct PolicyGuardStage {
    source: PolicySource,
    clock: Arc<dyn Clock>,
}

impl PolicyGuardStage {
    pub fn new(source: PolicySource, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }
}

#[async_trait]
impl Stage for PolicyGuardStage {
    fn id(&self) -> StageId {
        StageId::PolicyGuard
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let policy = self.source.resolve();
        let violations = evaluate(&state.plan, &policy, self.clock.now());

        if violations.is_empty() {
            return Ok(StateUpdate::new().policy_violations(violations));
        }

        warn!(
            incident = %state.incident.id,
            violations = violations.len(),
            "plan vetoed by policy, forcing dry-run"
        );
        let message = format!("Policy violations:\n- {}", violations.join("\n- "));
        Ok(StateUpdate::new()
            .approvals(Approvals { approved: false })
            .message(Message::assistant(message))
            .policy_violations(violations))
    }
}
