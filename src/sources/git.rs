use super::traits::DiffSource;
use crate::config::GitConfig;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

const GIT_TIMEOUT: Duration = Duration::from_secs(10);

/// `git diff -U0 <range>` in a local checkout. A failing git (not a repo,
/// bad range) yields an empty diff rather than an error.
pub struct GitDiffSource {
    repo_dir: PathBuf,
    range: String,
}

impl GitDiffSource {
    pub fn new(config: &GitConfig) -> Self {
        Self {
            repo_dir: config.repo_dir.clone(),
            range: config.range.clone(),
        }
    }
}

#[async_trait]
impl DiffSource for GitDiffSource {
    async fn latest_diff(&self) -> anyhow::Result<String> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.args(["diff", "-U0", &self.range])
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(GIT_TIMEOUT, cmd.output())
            .await
            .context("git diff timed out")?
            .context("failed to spawn git")?;

        if !output.status.success() {
            debug!(
                range = %self.range,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git diff failed, treating as no diff"
            );
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
