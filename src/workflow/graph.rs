//! Static stage graph and the pure routing function over it.
//!
//! ```text
//! triage -> fetch_diff -> runbook -+-> static_analysis -> style_review -> negotiation -+
//!                                  |                                                   v
//!                                  +----------------------------------------> policy_guard -> commander -> END
//! ```
//!
//! With `max_rounds > 1` the commander may also route back to triage while the
//! incident is unresolved.

use super::state::WorkflowState;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::IntoEnumIterator;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageId {
    Triage,
    FetchDiff,
    Runbook,
    StaticAnalysis,
    StyleReview,
    Negotiation,
    PolicyGuard,
    Commander,
}

pub const ENTRY: StageId = StageId::Triage;

const DEPLOY_KEYWORD: &str = "deploy";
const COMMIT_TOKEN_MIN_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    Stage(StageId),
    End,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stage(stage) => write!(f, "{stage}"),
            Self::End => f.write_str("END"),
        }
    }
}

fn retry_enabled(options: &WorkflowConfig) -> bool {
    options.max_rounds > 1
}

/// Every edge that can leave `stage`.
pub fn successors(stage: StageId, options: &WorkflowConfig) -> Vec<Route> {
    match stage {
        StageId::Triage => vec![Route::Stage(StageId::FetchDiff)],
        StageId::FetchDiff => vec![Route::Stage(StageId::Runbook)],
        StageId::Runbook => vec![
            Route::Stage(StageId::StaticAnalysis),
            Route::Stage(StageId::PolicyGuard),
        ],
        StageId::StaticAnalysis => vec![Route::Stage(StageId::StyleReview)],
        StageId::StyleReview => vec![Route::Stage(StageId::Negotiation)],
        StageId::Negotiation => vec![Route::Stage(StageId::PolicyGuard)],
        StageId::PolicyGuard => vec![Route::Stage(StageId::Commander)],
        StageId::Commander if retry_enabled(options) => {
            vec![Route::Stage(StageId::Triage), Route::End]
        }
        StageId::Commander => vec![Route::End],
    }
}

/// Pick the next stage from the post-merge state.
pub fn route(stage: StageId, state: &WorkflowState, options: &WorkflowConfig) -> Route {
    match stage {
        StageId::Runbook if needs_code_review(state, options) => {
            Route::Stage(StageId::StaticAnalysis)
        }
        StageId::Runbook => Route::Stage(StageId::PolicyGuard),
        StageId::Commander
            if retry_enabled(options) && !state.done && state.round < options.max_rounds =>
        {
            Route::Stage(StageId::Triage)
        }
        StageId::Commander => Route::End,
        other => successors(other, options)
            .into_iter()
            .next()
            .unwrap_or(Route::End),
    }
}

/// True when the incident looks code-related: a diff is present, or a signal
/// mentions a deployment (optionally: carries a commit-like token).
pub fn needs_code_review(state: &WorkflowState, options: &WorkflowConfig) -> bool {
    if state.has_diff() {
        return true;
    }
    state.signals.iter().any(|signal| {
        let mut text = signal.line.clone();
        for tag in &signal.tags {
            text.push(' ');
            text.push_str(tag);
        }
        if text.to_lowercase().contains(DEPLOY_KEYWORD) {
            return true;
        }
        options.route_on_commit_tokens
            && text.split_whitespace().any(|tok| {
                tok.chars().count() >= COMMIT_TOKEN_MIN_LEN && tok.chars().all(char::is_alphanumeric)
            })
    })
}

/// Upper bound on stage visits for one run.
pub fn max_visits(options: &WorkflowConfig) -> usize {
    StageId::iter().count() * options.max_rounds.max(1) as usize
}

/// Check the wiring: every stage has a successor, everything is reachable
/// from the entry and can reach the end, and the only cycle is the optional
/// retry edge.
pub fn validate_graph(options: &WorkflowConfig) -> Result<(), WorkflowError> {
    let mut adjacency: BTreeMap<StageId, Vec<StageId>> = BTreeMap::new();
    let mut reaches_end = BTreeSet::new();

    for stage in StageId::iter() {
        let routes = successors(stage, options);
        if routes.is_empty() {
            return Err(WorkflowError::InvalidGraph(format!(
                "stage {stage} has no successor"
            )));
        }
        let next = adjacency.entry(stage).or_default();
        for target in routes {
            match target {
                Route::Stage(to) => next.push(to),
                Route::End => {
                    reaches_end.insert(stage);
                }
            }
        }
    }

    let reachable = reachable_from(ENTRY, &adjacency);
    if let Some(orphan) = StageId::iter().find(|s| !reachable.contains(s)) {
        return Err(WorkflowError::InvalidGraph(format!(
            "stage {orphan} is unreachable from {ENTRY}"
        )));
    }

    for stage in StageId::iter() {
        let downstream = reachable_from(stage, &adjacency);
        if !downstream.iter().any(|s| reaches_end.contains(s)) {
            return Err(WorkflowError::InvalidGraph(format!(
                "stage {stage} can never reach END"
            )));
        }
    }

    // The retry edge is the one permitted back-edge.
    let mut forward = adjacency.clone();
    if retry_enabled(options)
        && let Some(next) = forward.get_mut(&StageId::Commander)
    {
        next.retain(|s| *s != StageId::Triage);
    }
    if let Some(cycle) = find_cycle(&forward) {
        let path = cycle
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(WorkflowError::InvalidGraph(format!("cycle detected: {path}")));
    }

    Ok(())
}

fn reachable_from(
    start: StageId,
    adjacency: &BTreeMap<StageId, Vec<StageId>>,
) -> BTreeSet<StageId> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(stage) = stack.pop() {
        for next in adjacency.get(&stage).into_iter().flatten() {
            if seen.insert(*next) {
                stack.push(*next);
            }
        }
    }
    seen
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

fn find_cycle(adjacency: &BTreeMap<StageId, Vec<StageId>>) -> Option<Vec<StageId>> {
    let mut states = BTreeMap::new();
    let mut stack = Vec::new();
    for stage in adjacency.keys() {
        if states.contains_key(stage) {
            continue;
        }
        if let Some(cycle) = detect_cycle(*stage, adjacency, &mut states, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn detect_cycle(
    stage: StageId,
    adjacency: &BTreeMap<StageId, Vec<StageId>>,
    states: &mut BTreeMap<StageId, VisitState>,
    stack: &mut Vec<StageId>,
) -> Option<Vec<StageId>> {
    states.insert(stage, VisitState::Visiting);
    stack.push(stage);

    for next in adjacency.get(&stage).into_iter().flatten() {
        match states.get(next) {
            Some(VisitState::Visiting) => {
                let index = stack.iter().position(|s| s == next).unwrap_or(0);
                let mut cycle = stack[index..].to_vec();
                cycle.push(*next);
                return Some(cycle);
            }
            Some(VisitState::Visited) => {}
            None => {
                if let Some(cycle) = detect_cycle(*next, adjacency, states, stack) {
                    return Some(cycle);
                }
            }
        }
    }

    stack.pop();
    states.insert(stage, VisitState::Visited);
    None
}
