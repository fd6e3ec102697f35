//! Code-review branch: static analysis of the diff, style notes from the
//! style corpus, and the revert/no-code-issue decision.

use super::{generate_or_note, search_or_note};
use crate::config::RunbookConfig;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::retrieval::{Retriever, format_snippets};
use crate::workflow::{Decision, Message, PlanStep, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Literal diff patterns and the finding each one produces.
pub const FORBIDDEN_PATTERNS: &[(&str, &str)] = &[
    ("print(", "print statements found"),
    ("0.0.0.0", "binding to 0.0.0.0 in diff"),
];

const STYLE_QUERY: &str = "style rules for error handling logging rollout rollback";
const DECISION_REASON: &str = "Heuristic decision based on issues count";

pub fn scan_diff(diff: &str) -> Vec<String> {
    FORBIDDEN_PATTERNS
        .iter()
        .filter(|(pattern, _)| diff.contains(pattern))
        .map(|(_, issue)| (*issue).to_string())
        .collect()
}

pub struct StaticAnalysisStage;

#[async_trait]
impl Stage for StaticAnalysisStage {
    fn id(&self) -> StageId {
        StageId::StaticAnalysis
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let findings = scan_diff(state.diff.as_deref().unwrap_or_default());
        let message = Message::assistant(format!("Static analysis: {} findings", findings.len()));

        let mut review = state.review.clone();
        for finding in findings {
            if !review.issues.contains(&finding) {
                review.issues.push(finding);
            }
        }
        Ok(StateUpdate::new().review(review).message(message))
    }
}

pub struct StyleReviewStage {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
}

impl StyleReviewStage {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn TextGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            top_k,
        }
    }
}

#[async_trait]
impl Stage for StyleReviewStage {
    fn id(&self) -> StageId {
        StageId::StyleReview
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let mut update = StateUpdate::new();
        let hits = match search_or_note(self.retriever.as_ref(), STYLE_QUERY, self.top_k, "style")
            .await
        {
            Ok(hits) => hits,
            Err(note) => {
                update = update.message(note);
                Vec::new()
            }
        };

        let prompt = format!(
            "Write concise style notes with [S1]/[S2] citations based on snippets:\n{}",
            format_snippets(&hits)
        );
        let notes = generate_or_note(self.generator.as_ref(), &prompt, "style notes").await;

        let mut review = state.review.clone();
        review.style = Some(match review.style.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n\n{}", notes.content),
            _ => notes.content.clone(),
        });

        Ok(update.review(review).message(notes))
    }
}

pub struct NegotiationStage {
    health_url: String,
}

impl NegotiationStage {
    pub fn new(runbook: &RunbookConfig) -> Self {
        Self {
            health_url: runbook.health_url.clone(),
        }
    }

    fn revert_step(&self, service: &str) -> PlanStep {
        PlanStep::new("Revert recent change")
            .command(format!("systemctl restart {service}"))
            .verify(format!("curl -s {}", self.health_url))
    }
}

#[async_trait]
impl Stage for NegotiationStage {
    fn id(&self) -> StageId {
        StageId::Negotiation
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let decision = if state.review.issues.is_empty() {
            Decision::NoCodeIssue
        } else {
            Decision::Revert
        };

        let mut review = state.review.clone();
        review.decision = Some(decision);
        review.reason = Some(DECISION_REASON.to_string());

        let mut plan = state.plan.clone();
        if decision == Decision::Revert {
            plan.insert(0, self.revert_step(&state.incident.service));
        }

        info!(decision = %decision, issues = state.review.issues.len(), "negotiation decided");
        Ok(StateUpdate::new()
            .review(review)
            .plan(plan)
            .message(Message::assistant(format!("Decision: {decision}"))))
    }
}
