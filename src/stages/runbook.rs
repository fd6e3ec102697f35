use super::{generate_or_note, search_or_note};
use crate::config::{RunbookConfig, TriageConfig};
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::retrieval::{Retriever, format_snippets};
use crate::workflow::{PlanStep, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;

const QUERY_WINDOW: usize = 50;
const PLAN_TAIL_LINES: u32 = 100;

/// The structural plan is a fixed template; retrieval only feeds the
/// narrative message.
pub fn template_plan(service: &str, runbook: &RunbookConfig, triage: &TriageConfig) -> Vec<PlanStep> {
    vec![
        PlanStep::new("Check health").command(format!("curl -s {}", runbook.health_url)),
        PlanStep::new("Tail logs").command(format!(
            "tail -n {PLAN_TAIL_LINES} {}",
            triage.log_path(service)
        )),
        PlanStep::new("Restart service")
            .command(format!("bash scripts/restart-{service}.sh"))
            .verify("echo 200"),
    ]
}

pub struct RunbookStage {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
    runbook: RunbookConfig,
    triage: TriageConfig,
    top_k: usize,
}

impl RunbookStage {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn TextGenerator>,
        runbook: RunbookConfig,
        triage: TriageConfig,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            runbook,
            triage,
            top_k,
        }
    }
}

#[async_trait]
impl Stage for RunbookStage {
    fn id(&self) -> StageId {
        StageId::Runbook
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let service = &state.incident.service;
        let recent = &state.signals[state.signals.len().saturating_sub(QUERY_WINDOW)..];
        let query = format!(
            "{service} {}",
            recent
                .iter()
                .map(|s| s.line.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut update = StateUpdate::new();
        let hits = match search_or_note(self.retriever.as_ref(), &query, self.top_k, "runbook").await {
            Ok(hits) => hits,
            Err(note) => {
                update = update.message(note);
                Vec::new()
            }
        };

        let prompt = format!(
            "Plan drafted from runbook hits for {service}:\n{}",
            format_snippets(&hits)
        );
        let narrative = generate_or_note(self.generator.as_ref(), &prompt, "runbook narrative").await;

        Ok(update
            .message(narrative)
            .plan(template_plan(service, &self.runbook, &self.triage)))
    }
}
