use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use opsbridge::config::Config;
use opsbridge::executor::{CommandAllowlist, CommandExecutor};
use opsbridge::llm::{Generation, TextGenerator};
use opsbridge::observability::{Observer, WorkflowEvent};
use opsbridge::policy::FixedClock;
use opsbridge::retrieval::{Retriever, Snippet};
use opsbridge::sources::{DiffSource, ExecutorLogSource, LogSource};
use opsbridge::{Collaborators, Runner};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Pops replies in order, then repeats the last one.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| (*r).to_string()).collect()),
            prompts: Mutex::default(),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, prompt: &str) -> anyhow::Result<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop().unwrap_or_default()
        } else {
            replies.last().cloned().unwrap_or_default()
        };
        Ok(Generation::new(reply))
    }
}

pub struct FixedRetriever;

#[async_trait]
impl Retriever for FixedRetriever {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<Snippet>> {
        Ok(vec![Snippet {
            source: "runbooks/toy-web.md".into(),
            score: 0.9,
            text: "Restart toy-web if health returns 502.".into(),
        }]
        .into_iter()
        .take(k)
        .collect())
    }
}

pub struct CannedLogs(pub Vec<String>);

impl CannedLogs {
    pub fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| (*l).to_string()).collect())
    }
}

#[async_trait]
impl LogSource for CannedLogs {
    async fn tail(&self, _service: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
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
}

#[async_trait]
impl DiffSource for CannedDiff {
    async fn latest_diff(&self) -> anyhow::Result<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.diff.clone())
    }
}

#[derive(Default)]
pub struct RecordingObserver(pub Mutex<Vec<WorkflowEvent>>);

impl RecordingObserver {
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &WorkflowEvent) {
        self.0.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 22:00 in New York: outside default business hours.
pub fn after_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap()
}

/// 10:00 in New York.
pub fn business_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
}

/// Config rooted in a temp dir, with a policy file that may not exist.
pub fn config_in(tmp: &TempDir) -> Config {
    Config {
        incident_dir: tmp.path().join("incidents"),
        policy_path: tmp.path().join("policy.yaml"),
        ..Config::default()
    }
}

pub fn write_policy(tmp: &TempDir, yaml: &str) {
    std::fs::write(tmp.path().join("policy.yaml"), yaml).unwrap();
}

pub struct Harness {
    pub runner: Runner,
    pub observer: Arc<RecordingObserver>,
    pub diff: Arc<CannedDiff>,
}

pub struct HarnessBuilder {
    config: Config,
    allowed: Vec<String>,
    log_lines: Vec<String>,
    tail_log_files: bool,
    diff: String,
    now: DateTime<Utc>,
}

impl HarnessBuilder {
    pub fn new(tmp: &TempDir) -> Self {
        Self {
            config: config_in(tmp),
            allowed: Vec::new(),
            log_lines: Vec::new(),
            tail_log_files: false,
            diff: String::new(),
            now: after_hours(),
        }
    }

    pub fn config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn allow(mut self, commands: &[&str]) -> Self {
        self.allowed.extend(commands.iter().map(|c| (*c).to_string()));
        self
    }

    pub fn logs(mut self, lines: &[&str]) -> Self {
        self.log_lines = lines.iter().map(|l| (*l).to_string()).collect();
        self
    }

    /// Read logs from disk through `triage.log_path_template` instead of
    /// canned lines.
    pub fn tail_log_files(mut self) -> Self {
        self.tail_log_files = true;
        self
    }

    pub fn diff(mut self, diff: &str) -> Self {
        self.diff = diff.into();
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> Harness {
        let observer = Arc::new(RecordingObserver::default());
        let diff = Arc::new(CannedDiff::new(&self.diff));
        let executor = Arc::new(CommandExecutor::new(CommandAllowlist::new(self.allowed)));
        let log_source: Arc<dyn LogSource> = if self.tail_log_files {
            Arc::new(ExecutorLogSource::new(self.config.triage.clone()))
        } else {
            Arc::new(CannedLogs(self.log_lines))
        };
        let collaborators = Collaborators {
            generator: Arc::new(ScriptedGenerator::new(&["summary"])),
            retriever: Arc::new(FixedRetriever),
            log_source,
            diff_source: diff.clone(),
            clock: Arc::new(FixedClock(self.now)),
            observer: observer.clone(),
        };
        let runner = Runner::new(&self.config, executor, collaborators).unwrap();
        Harness {
            runner,
            observer,
            diff,
        }
    }
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
