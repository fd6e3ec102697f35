use crate::workflow::StageId;
use std::time::Duration;

/// Workflow lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    RunStarted {
        incident_id: String,
        service: String,
        approved: bool,
    },
    StageStarted {
        stage: StageId,
        round: u32,
    },
    StageCompleted {
        stage: StageId,
        duration: Duration,
        messages_added: usize,
    },
    PolicyVetoed {
        violations: usize,
    },
    RunFinished {
        incident_id: String,
        done: bool,
        actions: usize,
    },
}

/// Core observer trait
pub trait Observer: Send + Sync {
    fn record_event(&self, event: &WorkflowEvent);

    fn flush(&self) {}

    fn name(&self) -> &str;
}
