//! The eight workflow stages and the helpers they share for calling
//! collaborators without failing the run.

pub mod commander;
pub mod diff;
pub mod policy_guard;
pub mod review;
pub mod runbook;
pub mod triage;

#[cfg(test)]
pub(crate) mod test_support;

pub use commander::{CommanderPhase, CommanderStage};
pub use diff::FetchDiffStage;
pub use policy_guard::{PolicyGuardStage, PolicySource};
pub use review::{NegotiationStage, StaticAnalysisStage, StyleReviewStage};
pub use runbook::RunbookStage;
pub use triage::TriageStage;

use crate::config::{RunbookConfig, TriageConfig};
use crate::executor::CommandExecutor;
use crate::llm::TextGenerator;
use crate::policy::Clock;
use crate::report::ReportStore;
use crate::retrieval::{Retriever, Snippet};
use crate::sources::{DiffSource, LogSource};
use crate::workflow::{Message, Stage};
use std::sync::Arc;
use tracing::warn;

/// Everything the standard stage set needs.
#[derive(Clone)]
pub struct StageContext {
    pub generator: Arc<dyn TextGenerator>,
    pub retriever: Arc<dyn Retriever>,
    pub log_source: Arc<dyn LogSource>,
    pub diff_source: Arc<dyn DiffSource>,
    pub executor: Arc<CommandExecutor>,
    pub reports: ReportStore,
    pub policy: PolicySource,
    pub clock: Arc<dyn Clock>,
    pub runbook: RunbookConfig,
    pub triage: TriageConfig,
    pub top_k: usize,
}

/// One implementation per stage id.
pub fn standard_stages(ctx: &StageContext) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(TriageStage::new(
            ctx.log_source.clone(),
            ctx.generator.clone(),
        )),
        Box::new(FetchDiffStage::new(ctx.diff_source.clone())),
        Box::new(RunbookStage::new(
            ctx.retriever.clone(),
            ctx.generator.clone(),
            ctx.runbook.clone(),
            ctx.triage.clone(),
            ctx.top_k,
        )),
        Box::new(StaticAnalysisStage),
        Box::new(StyleReviewStage::new(
            ctx.retriever.clone(),
            ctx.generator.clone(),
            ctx.top_k,
        )),
        Box::new(NegotiationStage::new(&ctx.runbook)),
        Box::new(PolicyGuardStage::new(ctx.policy.clone(), ctx.clock.clone())),
        Box::new(CommanderStage::new(
            ctx.executor.clone(),
            ctx.reports.clone(),
        )),
    ]
}

/// Model reply as an assistant message, or a system note when the model is
/// unreachable.
pub(crate) async fn generate_or_note(
    generator: &dyn TextGenerator,
    prompt: &str,
    what: &str,
) -> Message {
    match generator.invoke(prompt).await {
        Ok(generation) => Message::assistant(generation.content),
        Err(e) => {
            warn!(generator = generator.name(), error = %e, "{what} unavailable");
            Message::system(format!("{what} unavailable: {e}"))
        }
    }
}

/// Search results, or the note to append when retrieval is down.
pub(crate) async fn search_or_note(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
    what: &str,
) -> Result<Vec<Snippet>, Message> {
    retriever.search(query, k).await.map_err(|e| {
        warn!(retriever = retriever.name(), error = %e, "{what} retrieval unavailable");
        Message::system(format!("{what} retrieval unavailable: {e}"))
    })
}
