//! Test doubles and fixtures for ontomap crates.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ontomap_embed::{EmbedError, TextEmbedder};

// ── Mock embedder ───────────────────────────────────────────────────────────

/// Deterministic stand-in for a sentence model.
///
/// Each text becomes a hashed bag of character trigrams (case-folded), so
/// identical strings map to identical vectors, overlapping strings score
/// high and an empty string maps to the zero vector.
pub struct MockEmbedder {
    name: String,
    dim: usize,
    calls: AtomicUsize,
    fail_on: Option<String>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            name: "mock/trigram-embedder".to_string(),
            dim: 128,
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dim = dim.max(1);
        self
    }

    /// Fail any `embed` call whose input contains `term`.
    pub fn failing_on(mut self, term: &str) -> Self {
        self.fail_on = Some(term.to_string());
        self
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let folded = text.trim().to_lowercase();
        if folded.is_empty() {
            return v;
        }
        let chars: Vec<char> = format!(" {folded} ").chars().collect();
        for gram in chars.windows(3) {
            let mut hasher = DefaultHasher::new();
            gram.hash(&mut hasher);
            v[(hasher.finish() % self.dim as u64) as usize] += 1.0;
        }
        v
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEmbedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> ontomap_embed::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(bad) = &self.fail_on {
            if texts.iter().any(|t| t == bad) {
                return Err(EmbedError::Inference(format!("mock refused '{bad}'")));
            }
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Write a CSV with a single `column` holding `terms`.
pub fn write_terms_csv(path: &Path, column: &str, terms: &[&str]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([column, "Source"])?;
    for term in terms {
        writer.write_record([*term, "fixture"])?;
    }
    writer.flush()?;
    Ok(())
}

/// Create `<input_dir>/<drug>/` holding one `Outcome` CSV per `(file, terms)` pair.
pub fn write_drug_folder(
    input_dir: &Path,
    drug: &str,
    files: &[(&str, &[&str])],
) -> anyhow::Result<PathBuf> {
    let dir = input_dir.join(drug);
    std::fs::create_dir_all(&dir)?;
    for (file, terms) in files {
        write_terms_csv(&dir.join(file), "Outcome", terms)?;
    }
    Ok(dir)
}
