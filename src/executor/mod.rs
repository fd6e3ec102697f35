mod allowlist;

pub use allowlist::{CommandAllowlist, default_allowed_commands};

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Exit code reported for commands rejected by the allowlist.
pub const EXIT_NOT_PERMITTED: i32 = 127;
/// Exit code reported when a spawn fails or the timeout fires.
pub const EXIT_EXECUTION_FAILED: i32 = 1;
/// Default bound on a single approved command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Prefix marking simulated output.
pub const DRY_RUN_PREFIX: &str = "[dry-run]";

/// Structured outcome of one executor call. Never an error: every failure
/// mode is encoded in `stderr` and `exit_code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn not_permitted(command: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Command not allowed: {command}"),
            exit_code: EXIT_NOT_PERMITTED,
        }
    }

    pub fn dry_run(command: &str) -> Self {
        Self {
            stdout: format!("{DRY_RUN_PREFIX} {command}"),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: EXIT_EXECUTION_FAILED,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs allowlisted commands, either for real or as a side-effect-free preview.
///
/// Commands are split into argv with shell quoting rules and spawned directly,
/// never through a shell, so an allowlisted string cannot smuggle extra
/// commands. One attempt per call; there are no retries.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    allowlist: CommandAllowlist,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(allowlist: CommandAllowlist) -> Self {
        Self {
            allowlist,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &crate::config::ExecutorConfig) -> Self {
        Self::new(CommandAllowlist::new(config.allowed_commands.iter().cloned()))
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn allowlist(&self) -> &CommandAllowlist {
        &self.allowlist
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowlist.contains(command)
    }

    /// Execute `command` if it is allowlisted. With `approve == false` nothing
    /// is spawned and a synthetic success is returned.
    pub async fn execute(&self, command: &str, approve: bool) -> CommandResult {
        if !self.is_allowed(command) {
            warn!(command = %command, "command rejected by allowlist");
            return CommandResult::not_permitted(command);
        }

        if !approve {
            debug!(command = %command, "dry-run, not spawning");
            return CommandResult::dry_run(command);
        }

        let result = self.spawn(command).await;
        info!(
            command = %command,
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            "command executed"
        );
        result
    }

    async fn spawn(&self, command: &str) -> CommandResult {
        let argv = match shell_words::split(command) {
            Ok(argv) if !argv.is_empty() => argv,
            Ok(_) => return CommandResult::failed("empty command"),
            Err(e) => return CommandResult::failed(format!("failed to parse command: {e}")),
        };

        let mut cmd = tokio::process::Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => CommandResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                // Killed by a signal: no code to report verbatim.
                exit_code: output.status.code().unwrap_or(-1),
            },
            Ok(Err(e)) => CommandResult::failed(format!("Failed to execute command: {e}")),
            Err(_) => CommandResult::failed(format!(
                "Command timed out after {}s and was killed",
                self.timeout.as_secs_f64()
            )),
        }
    }
}
