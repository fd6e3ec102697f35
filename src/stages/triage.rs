use super::generate_or_note;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::sources::LogSource;
use crate::workflow::{Message, Signal, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const TAG_HTTP_502: &str = "HTTP_502";
pub const TAG_DEPLOY: &str = "DEPLOY";

const SUMMARY_WINDOW: usize = 40;

/// Tag each line with the fault markers it carries. Lines are trimmed.
pub fn parse_signals<S: AsRef<str>>(lines: &[S]) -> Vec<Signal> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref().trim();
            let mut tags = BTreeSet::new();
            if line.contains("502") {
                tags.insert(TAG_HTTP_502.to_string());
            }
            if line.to_lowercase().contains("deploy") {
                tags.insert(TAG_DEPLOY.to_string());
            }
            Signal {
                line: line.to_string(),
                tags,
            }
        })
        .collect()
}

pub struct TriageStage {
    logs: Arc<dyn LogSource>,
    generator: Arc<dyn TextGenerator>,
}

impl TriageStage {
    pub fn new(logs: Arc<dyn LogSource>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { logs, generator }
    }
}

#[async_trait]
impl Stage for TriageStage {
    fn id(&self) -> StageId {
        StageId::Triage
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let service = &state.incident.service;
        let round = state.round + 1;
        let mut update = StateUpdate::new().round(round);

        let lines = match self.logs.tail(service).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(service = %service, error = %e, "log tail unavailable");
                update = update.message(Message::system(format!("Log tail unavailable: {e}")));
                Vec::new()
            }
        };

        let signals = parse_signals(lines.as_slice());
        let recent = &signals[signals.len().saturating_sub(SUMMARY_WINDOW)..];
        let prompt = format!(
            "Summarize key symptoms:\n{}",
            recent
                .iter()
                .map(|s| s.line.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        );
        let summary = generate_or_note(self.generator.as_ref(), &prompt, "symptom summary").await;

        info!(
            service = %service,
            round,
            signals = signals.len(),
            "triage complete"
        );
        Ok(update.message(summary).signals(signals))
    }
}
