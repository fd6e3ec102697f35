//! In-process TF-IDF index over markdown files.

use super::traits::{MAX_SNIPPET_CHARS, Retriever, Snippet};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

struct Document {
    source: String,
    text: String,
    /// L2-normalised tf-idf weights
    weights: HashMap<String, f64>,
}

pub struct LocalRetriever {
    documents: Vec<Document>,
    idf: HashMap<String, f64>,
}

/// Lowercased runs of two or more alphanumeric characters.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|tok| tok.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

fn normalise(weights: &mut HashMap<String, f64>) {
    let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for w in weights.values_mut() {
            *w /= norm;
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl LocalRetriever {
    /// Build an index from `(source, text)` pairs.
    pub fn from_documents<I, S, T>(docs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let raw: Vec<(String, String, HashMap<String, f64>)> = docs
            .into_iter()
            .map(|(s, t)| {
                let text = t.into();
                let counts = term_counts(&text);
                (s.into(), text, counts)
            })
            .collect();

        let mut df: HashMap<String, usize> = HashMap::new();
        for (_, _, counts) in &raw {
            for term in counts.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        #[allow(clippy::cast_precision_loss)]
        let n = raw.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| (term, ((1.0 + n) / (1.0 + count as f64)).ln() + 1.0))
            .collect();

        let documents = raw
            .into_iter()
            .map(|(source, text, counts)| {
                let mut weights: HashMap<String, f64> = counts
                    .into_iter()
                    .map(|(term, tf)| {
                        let w = tf * idf.get(&term).copied().unwrap_or(0.0);
                        (term, w)
                    })
                    .collect();
                normalise(&mut weights);
                Document {
                    source,
                    text,
                    weights,
                }
            })
            .collect();

        Self { documents, idf }
    }

    /// Index every `*.md` file directly under each directory. Missing
    /// directories are skipped.
    pub async fn load(dirs: &[PathBuf]) -> anyhow::Result<Self> {
        let mut docs = Vec::new();
        for dir in dirs {
            docs.extend(read_markdown_dir(dir).await?);
        }
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        info!(documents = docs.len(), "retrieval index built");
        Ok(Self::from_documents(docs))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn query_weights(&self, query: &str) -> HashMap<String, f64> {
        let mut weights: HashMap<String, f64> = term_counts(query)
            .into_iter()
            .filter_map(|(term, tf)| self.idf.get(&term).map(|idf| (term, tf * idf)))
            .collect();
        normalise(&mut weights);
        weights
    }

    pub fn rank(&self, query: &str, k: usize) -> Vec<Snippet> {
        let q = self.query_weights(query);
        let mut scored: Vec<Snippet> = self
            .documents
            .iter()
            .map(|doc| Snippet {
                source: doc.source.clone(),
                score: q
                    .iter()
                    .map(|(term, w)| w * doc.weights.get(term).copied().unwrap_or(0.0))
                    .sum(),
                text: truncate_chars(&doc.text, MAX_SNIPPET_CHARS),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.source.cmp(&b.source))
        });
        scored.truncate(k);
        scored
    }
}

async fn read_markdown_dir(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "corpus directory missing, skipping");
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            let text = fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            out.push((path.display().to_string(), text));
        }
    }
    Ok(out)
}

#[async_trait]
impl Retriever for LocalRetriever {
    fn name(&self) -> &str {
        "local"
    }

    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<Snippet>> {
        Ok(self.rank(query, k))
    }
}
