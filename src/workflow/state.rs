use crate::executor::CommandResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Severity {
    P1,
    #[default]
    P2,
    P3,
    P4,
}

/// Fixed at run start, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub service: String,
    pub started_at: DateTime<Utc>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One log line plus the fault markers found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub line: String,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_command: Option<String>,
}

impl PlanStep {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn verify(mut self, command: impl Into<String>) -> Self {
        self.verify_command = Some(command.into());
        self
    }

    pub fn rollback(mut self, command: impl Into<String>) -> Self {
        self.rollback_command = Some(command.into());
        self
    }

    /// The command, if present and not blank.
    pub fn effective_command(&self) -> Option<&str> {
        non_blank(self.command.as_deref())
    }

    pub fn effective_verify(&self) -> Option<&str> {
        non_blank(self.verify_command.as_deref())
    }

    pub fn effective_rollback(&self) -> Option<&str> {
        non_blank(self.rollback_command.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Execution record for one plan step. A step without a command still gets a
/// record (with no results) so action *i* always lines up with plan step *i*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub step: PlanStep,
    pub command_result: Option<CommandResult>,
    pub verify_result: Option<CommandResult>,
    /// Triage round the record was produced in
    pub round: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approvals {
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
    Revert,
    NoCodeIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub issues: Vec<String>,
    pub decision: Option<Decision>,
    pub reason: Option<String>,
    pub style: Option<String>,
}

/// Shared state owned by the orchestrator for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub incident: Incident,
    pub messages: Vec<Message>,
    pub signals: Vec<Signal>,
    pub plan: Vec<PlanStep>,
    pub actions: Vec<ActionRecord>,
    pub approvals: Approvals,
    pub diff: Option<String>,
    pub review: Review,
    pub policy_violations: Vec<String>,
    pub done: bool,
    pub round: u32,
}

impl WorkflowState {
    pub fn new(incident: Incident, approved: bool) -> Self {
        Self {
            incident,
            messages: Vec::new(),
            signals: Vec::new(),
            plan: Vec::new(),
            actions: Vec::new(),
            approvals: Approvals { approved },
            diff: None,
            review: Review::default(),
            policy_violations: Vec::new(),
            done: false,
            round: 0,
        }
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        let diff = diff.into();
        self.diff = (!diff.is_empty()).then_some(diff);
        self
    }

    pub fn has_diff(&self) -> bool {
        self.diff.as_deref().is_some_and(|d| !d.is_empty())
    }

    pub fn is_approved(&self) -> bool {
        self.approvals.approved
    }

    /// Action records produced in the current round.
    pub fn current_round_actions(&self) -> impl Iterator<Item = &ActionRecord> {
        let round = self.round;
        self.actions.iter().filter(move |a| a.round == round)
    }

    /// Merge a stage's partial update.
    ///
    /// `messages` and `actions` append; every other field present in the
    /// update replaces the current value. Approval can only be revoked, and
    /// a diff that is already set is never overwritten.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            messages,
            signals,
            plan,
            actions,
            approvals,
            diff,
            review,
            policy_violations,
            done,
            round,
        } = update;

        self.messages.extend(messages);
        self.actions.extend(actions);

        if let Some(signals) = signals {
            self.signals = signals;
        }
        if let Some(plan) = plan {
            self.plan = plan;
        }
        if let Some(approvals) = approvals {
            if approvals.approved && !self.approvals.approved {
                warn!("ignoring attempt to re-grant approval");
            } else {
                self.approvals = approvals;
            }
        }
        if let Some(diff) = diff {
            if self.has_diff() {
                warn!("diff already set, keeping original");
            } else if !diff.is_empty() {
                self.diff = Some(diff);
            }
        }
        if let Some(review) = review {
            self.review = review;
        }
        if let Some(violations) = policy_violations {
            self.policy_violations = violations;
        }
        if let Some(done) = done {
            self.done = done;
        }
        if let Some(round) = round {
            self.round = round;
        }
    }
}

/// The subset of state a stage intends to change. Absent fields are left
/// untouched by [`WorkflowState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub signals: Option<Vec<Signal>>,
    pub plan: Option<Vec<PlanStep>>,
    pub actions: Vec<ActionRecord>,
    pub approvals: Option<Approvals>,
    pub diff: Option<String>,
    pub review: Option<Review>,
    pub policy_violations: Option<Vec<String>>,
    pub done: Option<bool>,
    pub round: Option<u32>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn signals(mut self, signals: Vec<Signal>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn plan(mut self, plan: Vec<PlanStep>) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn actions(mut self, actions: Vec<ActionRecord>) -> Self {
        self.actions = actions;
        self
    }

    pub fn approvals(mut self, approvals: Approvals) -> Self {
        self.approvals = Some(approvals);
        self
    }

    pub fn diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = Some(diff.into());
        self
    }

    pub fn review(mut self, review: Review) -> Self {
        self.review = Some(review);
        self
    }

    pub fn policy_violations(mut self, violations: Vec<String>) -> Self {
        self.policy_violations = Some(violations);
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    pub fn round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }
}
