use super::traits::{Observer, WorkflowEvent};

/// Discards every event
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &WorkflowEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StageId;

    #[test]
    fn noop_name() {
        assert_eq!(NoopObserver.name(), "noop");
    }

    #[test]
    fn noop_record_event_does_not_panic() {
        NoopObserver.record_event(&WorkflowEvent::StageStarted {
            stage: StageId::Triage,
            round: 0,
        });
        NoopObserver.flush();
    }
}
