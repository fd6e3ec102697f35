use crate::executor::{DEFAULT_TIMEOUT_SECS, default_allowed_commands};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was loaded from - not serialized
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Where incident reports are written, one file per incident id
    #[serde(default = "default_incident_dir")]
    pub incident_dir: PathBuf,

    /// Optional policy override file merged over built-in defaults
    #[serde(default = "default_policy_path")]
    pub policy_path: PathBuf,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub triage: TriageConfig,

    #[serde(default)]
    pub runbook: RunbookConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_incident_dir() -> PathBuf {
    PathBuf::from("incidents")
}

fn default_policy_path() -> PathBuf {
    PathBuf::from("policies/policy.yaml")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            incident_dir: default_incident_dir(),
            policy_path: default_policy_path(),
            executor: ExecutorConfig::default(),
            triage: TriageConfig::default(),
            runbook: RunbookConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            git: GitConfig::default(),
            workflow: WorkflowConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

// ── Executor ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ── Triage ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// `{service}` is replaced with the incident's service name
    #[serde(default = "default_log_path_template")]
    pub log_path_template: String,
    #[serde(default = "default_tail_lines")]
    pub tail_lines: u32,
}

fn default_log_path_template() -> String {
    "logs/{service}.log".into()
}

fn default_tail_lines() -> u32 {
    200
}

impl TriageConfig {
    pub fn log_path(&self, service: &str) -> String {
        self.log_path_template.replace("{service}", service)
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            log_path_template: default_log_path_template(),
            tail_lines: default_tail_lines(),
        }
    }
}

// ── Runbook ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunbookConfig {
    #[serde(default = "default_health_url")]
    pub health_url: String,
}

fn default_health_url() -> String {
    "http://localhost:8080/health".into()
}

impl Default for RunbookConfig {
    fn default() -> Self {
        Self {
            health_url: default_health_url(),
        }
    }
}

// ── Text generation ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" | "static"
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_provider() -> String {
    "openai".into()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

// ── Retrieval ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_corpus_dirs")]
    pub corpus_dirs: Vec<PathBuf>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_corpus_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("runbooks"), PathBuf::from("docs")]
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_dirs: default_corpus_dirs(),
            top_k: default_top_k(),
        }
    }
}

// ── Git ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,
    #[serde(default = "default_git_range")]
    pub range: String,
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_git_range() -> String {
    "HEAD~1..HEAD".into()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repo_dir: default_repo_dir(),
            range: default_git_range(),
        }
    }
}

// ── Workflow ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// 1 disables the commander -> triage retry edge
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Also take the code-review branch when a signal line carries a
    /// commit-like token (7+ alphanumeric characters)
    #[serde(default)]
    pub route_on_commit_tokens: bool,
}

fn default_max_rounds() -> u32 {
    1
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            route_on_commit_tokens: false,
        }
    }
}

// ── Observability ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "log" | "none"
    #[serde(default = "default_observability_backend")]
    pub backend: String,
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_observability_backend() -> String {
    "log".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: default_observability_backend(),
            level: default_log_level(),
        }
    }
}
