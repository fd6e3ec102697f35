use crate::error::Result;
use crate::sources::DiffSource;
use crate::workflow::{Message, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fills `diff` once. A diff already in state is never refetched.
pub struct FetchDiffStage {
    source: Arc<dyn DiffSource>,
}

impl FetchDiffStage {
    pub fn new(source: Arc<dyn DiffSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Stage for FetchDiffStage {
    fn id(&self) -> StageId {
        StageId::FetchDiff
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        if state.has_diff() {
            debug!("diff already present, skipping fetch");
            return Ok(StateUpdate::new());
        }

        match self.source.latest_diff().await {
            Ok(diff) if !diff.trim().is_empty() => Ok(StateUpdate::new()
                .diff(diff)
                .message(Message::assistant("Fetched latest git diff"))),
            Ok(_) => Ok(StateUpdate::new()),
            Err(e) => {
                warn!(error = %e, "diff source unavailable");
                Ok(StateUpdate::new())
            }
        }
    }
}
