use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::report::ReportStore;
use crate::workflow::{ActionRecord, Message, Stage, StageId, StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Substring of a verify command's stdout that marks the incident resolved.
pub const RESOLVED_MARKER: &str = "200";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CommanderPhase {
    AwaitingApproval,
    Executing,
    Resolved,
}

impl CommanderPhase {
    fn advance(&mut self, to: Self) {
        debug!(from = %self, to = %to, "commander phase");
        *self = to;
    }
}

/// Terminal stage: previews the plan when unapproved, otherwise runs it step
/// by step. Either way the incident report is written.
pub struct CommanderStage {
    executor: Arc<CommandExecutor>,
    reports: ReportStore,
}

impl CommanderStage {
    pub fn new(executor: Arc<CommandExecutor>, reports: ReportStore) -> Self {
        Self { executor, reports }
    }

    async fn preview(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let commands: Vec<&str> = state
            .plan
            .iter()
            .filter_map(|step| step.effective_command())
            .collect();
        let path = self.reports.write(state).await?;

        info!(
            incident = %state.incident.id,
            proposed = commands.len(),
            "dry-run preview written"
        );
        let message = format!(
            "Dry-run (no approval). Proposed commands:\n{}\n\nReport written: {}",
            commands.join("\n"),
            path.display()
        );
        Ok(StateUpdate::new()
            .message(Message::assistant(message))
            .done(true))
    }

    async fn execute_plan(&self, state: &WorkflowState) -> Vec<ActionRecord> {
        let mut records = Vec::with_capacity(state.plan.len());
        for step in &state.plan {
            let mut record = ActionRecord {
                step: step.clone(),
                command_result: None,
                verify_result: None,
                round: state.round,
            };
            if let Some(command) = step.effective_command() {
                record.command_result = Some(self.executor.execute(command, true).await);
                if let Some(verify) = step.effective_verify() {
                    record.verify_result = Some(self.executor.execute(verify, true).await);
                }
            }
            records.push(record);
        }
        records
    }
}

/// True when any verify output carries the success marker.
pub fn is_resolved(actions: &[ActionRecord]) -> bool {
    actions.iter().any(|action| {
        action
            .verify_result
            .as_ref()
            .is_some_and(|r| r.stdout.contains(RESOLVED_MARKER))
    })
}

#[async_trait]
impl Stage for CommanderStage {
    fn id(&self) -> StageId {
        StageId::Commander
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let mut phase = CommanderPhase::AwaitingApproval;

        if !state.is_approved() {
            let update = self.preview(state).await?;
            phase.advance(CommanderPhase::Resolved);
            return Ok(update);
        }

        phase.advance(CommanderPhase::Executing);
        let records = self.execute_plan(state).await;
        let done = is_resolved(&records);

        let mut reported = state.clone();
        reported.actions.extend(records.iter().cloned());
        let path = self.reports.write(&reported).await?;
        phase.advance(CommanderPhase::Resolved);

        info!(
            incident = %state.incident.id,
            round = state.round,
            actions = records.len(),
            done,
            "plan executed"
        );
        Ok(StateUpdate::new()
            .actions(records)
            .done(done)
            .message(Message::assistant(format!(
                "Report written: {}",
                path.display()
            ))))
    }
}
