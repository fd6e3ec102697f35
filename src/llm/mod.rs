pub mod fixed;
pub mod openai;
pub mod traits;

pub use fixed::StaticGenerator;
pub use openai::OpenAiCompatibleGenerator;
pub use traits::{Generation, TextGenerator};

use crate::config::LlmConfig;
use std::sync::Arc;

/// Factory: pick a generator by provider name. Unknown names fall back to
/// the offline generator with a warning.
pub fn create_generator(config: &LlmConfig) -> Arc<dyn TextGenerator> {
    match config.provider.as_str() {
        "openai" | "openai-compatible" | "compatible" => {
            Arc::new(OpenAiCompatibleGenerator::new(config))
        }
        "static" | "offline" => Arc::new(StaticGenerator::default()),
        other => {
            tracing::warn!(provider = other, "unknown llm provider, using offline generator");
            Arc::new(StaticGenerator::default())
        }
    }
}
