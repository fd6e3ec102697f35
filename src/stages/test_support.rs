use crate::llm::{Generation, TextGenerator};
use crate::retrieval::{Retriever, Snippet};
use crate::sources::{DiffSource, LogSource};
use crate::workflow::{Incident, Severity, WorkflowState};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Mutex;

/// Replies with a fixed string and remembers every prompt.
#[derive(Default)]
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn invoke(&self, prompt: &str) -> anyhow::Result<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Generation::new(self.reply.clone()))
    }
}

pub struct DownGenerator;

#[async_trait]
impl TextGenerator for DownGenerator {
    fn name(&self) -> &str {
        "down"
    }

    async fn invoke(&self, _prompt: &str) -> anyhow::Result<Generation> {
        anyhow::bail!("connection refused")
    }
}

/// Returns the same snippets for every query and records queries.
#[derive(Default)]
pub struct FixedRetriever {
    pub snippets: Vec<Snippet>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FixedRetriever {
    pub fn with(sources: &[&str]) -> Self {
        Self {
            snippets: sources
                .iter()
                .map(|s| Snippet {
                    source: (*s).to_string(),
                    score: 1.0,
                    text: format!("text of {s}"),
                })
                .collect(),
            queries: Mutex::default(),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<Snippet>> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        Ok(self.snippets.iter().take(k).cloned().collect())
    }
}

pub struct DownRetriever;

#[async_trait]
impl Retriever for DownRetriever {
    fn name(&self) -> &str {
        "down"
    }

    async fn search(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<Snippet>> {
        anyhow::bail!("index missing")
    }
}

pub struct CannedLogs(pub Result<Vec<String>, String>);

impl CannedLogs {
    pub fn lines(lines: &[&str]) -> Self {
        Self(Ok(lines.iter().map(|l| (*l).to_string()).collect()))
    }
}

#[async_trait]
impl LogSource for CannedLogs {
    async fn tail(&self, _service: &str) -> anyhow::Result<Vec<String>> {
        self.0.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

#[derive(Default)]
pub struct CannedDiff {
    pub diff: String,
    pub calls: Mutex<usize>,
}

impl CannedDiff {
    pub fn new(diff: &str) -> Self {
        Self {
            diff: diff.into(),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DiffSource for CannedDiff {
    async fn latest_diff(&self) -> anyhow::Result<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.diff.clone())
    }
}

pub fn state(approved: bool) -> WorkflowState {
    WorkflowState::new(
        Incident {
            id: "INC-20240116-030000-beef".into(),
            service: "toy-web".into(),
            started_at: Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap(),
            severity: Severity::P2,
        },
        approved,
    )
}
