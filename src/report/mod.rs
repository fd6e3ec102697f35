//! Markdown incident report: a pure renderer plus a directory-backed store.

use crate::error::ReportError;
use crate::workflow::{ActionRecord, WorkflowState};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const MAX_SYMPTOMS: usize = 20;
const MAX_STDOUT_CHARS: usize = 600;

/// Render `state` as markdown. Output depends on `state` alone.
pub fn render(state: &WorkflowState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# Incident {} - {}",
        state.incident.id, state.incident.service
    );

    out.push_str("\n## Symptoms\n");
    for signal in state.signals.iter().take(MAX_SYMPTOMS) {
        let _ = writeln!(out, "- {}", signal.line);
    }

    out.push_str("\n## Plan\n");
    for (i, step) in state.plan.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step.description);
    }

    out.push_str("\n## Actions\n");
    let rounds: BTreeSet<u32> = state.actions.iter().map(|a| a.round).collect();
    if rounds.len() > 1 {
        for round in rounds {
            let _ = writeln!(out, "\n### Round {round}");
            for action in state.actions.iter().filter(|a| a.round == round) {
                render_action(&mut out, action);
            }
        }
    } else {
        for action in &state.actions {
            render_action(&mut out, action);
        }
    }

    out
}

fn render_action(out: &mut String, action: &ActionRecord) {
    let _ = writeln!(out, "- {}", action.step.description);
    if let Some(result) = &action.command_result {
        let stdout: String = result.stdout.chars().take(MAX_STDOUT_CHARS).collect();
        let _ = writeln!(out, "  ```\n{stdout}\n  ```");
    }
}

/// Writes one report per incident id under a directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, incident_id: &str) -> PathBuf {
        self.dir.join(format!("{incident_id}.md"))
    }

    /// Render and write the report, replacing any earlier one for the same
    /// incident.
    pub async fn write(&self, state: &WorkflowState) -> Result<PathBuf, ReportError> {
        let path = self.path_for(&state.incident.id);
        let failed = |source| ReportError::Write {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(failed)?;
        tokio::fs::write(&path, render(state))
            .await
            .map_err(failed)?;

        info!(path = %path.display(), "incident report written");
        Ok(path)
    }
}
