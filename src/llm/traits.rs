use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Free-text reply from a text-generation backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
}

impl Generation {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str) -> anyhow::Result<Generation>;
}
