use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Maximum characters of document text carried in a snippet.
pub const MAX_SNIPPET_CHARS: usize = 1200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub source: String,
    pub score: f64,
    pub text: String,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `k` snippets ranked by descending score.
    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<Snippet>>;
}
