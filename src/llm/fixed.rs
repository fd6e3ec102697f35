use super::traits::{Generation, TextGenerator};
use async_trait::async_trait;

/// Offline generator: echoes a fixed reply, optionally followed by the
/// first line of the prompt. Deterministic.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    reply: String,
    echo_prompt: bool,
}

impl StaticGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            echo_prompt: false,
        }
    }

    pub fn echoing(mut self) -> Self {
        self.echo_prompt = true;
        self
    }
}

impl Default for StaticGenerator {
    fn default() -> Self {
        Self::new("(offline) no model configured").echoing()
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    fn name(&self) -> &str {
        "static"
    }

    async fn invoke(&self, prompt: &str) -> anyhow::Result<Generation> {
        if !self.echo_prompt {
            return Ok(Generation::new(self.reply.clone()));
        }
        let head = prompt.lines().next().unwrap_or_default();
        Ok(Generation::new(format!("{}: {head}", self.reply)))
    }
}
