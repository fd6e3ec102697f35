use super::traits::LogSource;
use crate::config::TriageConfig;
use crate::executor::{CommandAllowlist, CommandExecutor, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use std::time::Duration;

/// Tails the service log through a command executor scoped to that one tail
/// command. Log reads are not plan commands: they are read-only and always
/// permitted, whatever the operator allowlist holds.
pub struct ExecutorLogSource {
    config: TriageConfig,
    timeout: Duration,
}

impl ExecutorLogSource {
    pub fn new(config: TriageConfig) -> Self {
        Self {
            config,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tail_command(&self, service: &str) -> String {
        format!(
            "tail -n {} {}",
            self.config.tail_lines,
            self.config.log_path(service)
        )
    }
}

#[async_trait]
impl LogSource for ExecutorLogSource {
    async fn tail(&self, service: &str) -> anyhow::Result<Vec<String>> {
        let command = self.tail_command(service);
        let executor = CommandExecutor::new(CommandAllowlist::new([command.as_str()]))
            .with_timeout(self.timeout);
        let result = executor.execute(&command, true).await;
        if !result.success() {
            anyhow::bail!(
                "`{command}` exited with {}: {}",
                result.exit_code,
                result.stderr.trim()
            );
        }
        Ok(result.stdout.lines().map(str::to_string).collect())
    }
}
