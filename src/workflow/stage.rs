use super::graph::StageId;
use super::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;

/// One node of the workflow graph: a transform from the shared state to a
/// partial update. Stages read the state they are handed and must not keep
/// it beyond the call.
#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    async fn run(&self, state: &WorkflowState) -> crate::error::Result<StateUpdate>;
}
