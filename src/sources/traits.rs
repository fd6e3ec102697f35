use async_trait::async_trait;

/// Recent log lines for a service, oldest first.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn tail(&self, service: &str) -> anyhow::Result<Vec<String>>;
}

/// Latest version-control diff. An empty string means "no change found".
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn latest_diff(&self) -> anyhow::Result<String>;
}
