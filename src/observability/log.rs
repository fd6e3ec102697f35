use super::traits::{Observer, WorkflowEvent};
use tracing::{info, warn};

/// Emits each workflow event as a `tracing` record
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::RunStarted {
                incident_id,
                service,
                approved,
            } => {
                info!(incident = %incident_id, service = %service, approved, "run.start");
            }
            WorkflowEvent::StageStarted { stage, round } => {
                info!(stage = %stage, round, "stage.start");
            }
            WorkflowEvent::StageCompleted {
                stage,
                duration,
                messages_added,
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                info!(stage = %stage, duration_ms = ms, messages = messages_added, "stage.end");
            }
            WorkflowEvent::PolicyVetoed { violations } => {
                warn!(violations, "policy.veto");
            }
            WorkflowEvent::RunFinished {
                incident_id,
                done,
                actions,
            } => {
                info!(incident = %incident_id, done, actions, "run.end");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StageId;
    use std::time::Duration;

    #[test]
    fn log_observer_name() {
        assert_eq!(LogObserver::new().name(), "log");
    }

    #[test]
    fn log_observer_handles_every_event() {
        let obs = LogObserver::new();
        let events = [
            WorkflowEvent::RunStarted {
                incident_id: "INC-1".into(),
                service: "toy-web".into(),
                approved: false,
            },
            WorkflowEvent::StageStarted {
                stage: StageId::Commander,
                round: 1,
            },
            WorkflowEvent::StageCompleted {
                stage: StageId::Commander,
                duration: Duration::from_millis(12),
                messages_added: 1,
            },
            WorkflowEvent::PolicyVetoed { violations: 2 },
            WorkflowEvent::RunFinished {
                incident_id: "INC-1".into(),
                done: true,
                actions: 0,
            },
        ];
        for event in &events {
            obs.record_event(event);
        }
    }

    #[test]
    fn log_observer_huge_duration_saturates() {
        LogObserver::new().record_event(&WorkflowEvent::StageCompleted {
            stage: StageId::Triage,
            duration: Duration::from_secs(u64::MAX),
            messages_added: 0,
        });
    }
}
