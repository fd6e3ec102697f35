pub mod local;
pub mod traits;

pub use local::LocalRetriever;
pub use traits::{MAX_SNIPPET_CHARS, Retriever, Snippet};

/// Render snippets as `[S1] source\ntext` blocks for prompts.
pub fn format_snippets(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[S{}] {}\n{}", i + 1, s.source, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
