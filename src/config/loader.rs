use super::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

impl Config {
    /// Load from `path`, falling back to defaults when the file is absent.
    /// Environment overrides are applied and the result validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
            config.config_path = Some(path.to_path_buf());
            config
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.allowed_commands.is_empty() {
            return Err(ConfigError::Validation(
                "executor.allowed_commands must not be empty".into(),
            ));
        }
        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "executor.timeout_secs must be > 0".into(),
            ));
        }
        if self.workflow.max_rounds == 0 {
            return Err(ConfigError::Validation(
                "workflow.max_rounds must be >= 1".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Validation("retrieval.top_k must be >= 1".into()));
        }
        if !self.triage.log_path_template.contains("{service}") {
            tracing::warn!(
                template = %self.triage.log_path_template,
                "triage.log_path_template has no {{service}} placeholder; all services share one log"
            );
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(
                "llm.temperature must be in [0.0, 2.0]".into(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Load(e.to_string()))
    }
}
