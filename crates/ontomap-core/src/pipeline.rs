//! The per-drug mapping pass.
//!
//! For every drug folder under the input directory:
//!   1. Match the predicted and observed CSVs by filename suffix
//!   2. Read the term column of each, preserving order
//!   3. Embed both term lists with the injected embedder
//!   4. Compute the predicted × observed cosine-similarity matrix
//!   5. Write it (and optionally the embeddings) under the model's output dir
//!
//! Folders lacking an input file are skipped and write failures are recorded;
//! the batch continues in both cases. Unreadable inputs, a missing term
//! column or an embedding failure abort the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ontomap_config::MappingConfig;
use ontomap_embed::{EmbedError, TextEmbedder};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::output::{embeddings_path, similarity_matrix_path, write_embeddings_csv, write_similarity_csv};
use crate::resolver::{discover_drug_dirs, resolve_drug, DrugInputs, Resolution};
use crate::similarity::SimilarityMatrix;
use crate::terms::read_terms;

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for one mapping run.
#[derive(Debug, Clone, Serialize)]
pub struct MappingJob {
    /// Directory with one sub-folder per drug.
    pub input_dir: PathBuf,
    /// Root under which `<model>/<drug>/` output folders are created.
    pub output_root: PathBuf,
    pub predicted_dataset: String,
    pub observed_dataset: String,
    pub term_column: String,
    pub precision: usize,
    pub save_embeddings: bool,
    pub preview: usize,
}

impl MappingJob {
    pub fn from_config(config: &MappingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            input_dir: config.input_dir(),
            output_root: config.output_root(),
            predicted_dataset: config.datasets.predicted.clone(),
            observed_dataset: config.datasets.observed.clone(),
            term_column: config.datasets.term_column.clone(),
            precision: config.output.precision,
            save_embeddings: config.output.save_embeddings,
            preview: config.output.preview,
        })
    }

    pub fn predicted_suffix(&self) -> String {
        format!("{}.csv", self.predicted_dataset)
    }

    pub fn observed_suffix(&self) -> String {
        format!("{}.csv", self.observed_dataset)
    }

    fn model_dir(&self, model_name: &str) -> PathBuf {
        self.output_root.join(model_name)
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDrug {
    pub drug: String,
    pub predicted_terms: usize,
    pub observed_terms: usize,
    pub dimension: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDrug {
    pub drug: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDrug {
    pub drug: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub model: String,
    pub processed: Vec<ProcessedDrug>,
    pub skipped: Vec<SkippedDrug>,
    pub failed: Vec<FailedDrug>,
    pub duration_ms: u64,
}

impl MappingReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What happened to one drug whose inputs were found.
#[derive(Debug, Clone)]
pub enum DrugOutcome {
    Written(ProcessedDrug),
    WriteFailed(FailedDrug),
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

/// Run the mapping over every drug folder in `job.input_dir`, one at a time.
pub async fn run_mapping(job: &MappingJob, embedder: &dyn TextEmbedder) -> Result<MappingReport> {
    let start = Instant::now();
    let predicted_suffix = job.predicted_suffix();
    let observed_suffix = job.observed_suffix();

    info!(
        model = embedder.model_name(),
        predicted = %job.predicted_dataset,
        observed = %job.observed_dataset,
        input = %job.input_dir.display(),
        "Starting similarity mapping"
    );

    let mut report = MappingReport {
        model: embedder.model_name().to_string(),
        processed: Vec::new(),
        skipped: Vec::new(),
        failed: Vec::new(),
        duration_ms: 0,
    };

    for (drug, dir) in discover_drug_dirs(&job.input_dir)? {
        info!("══════ Processing drug: {} ══════", drug);

        let inputs = match resolve_drug(&drug, &dir, &predicted_suffix, &observed_suffix)? {
            Resolution::Ready(inputs) => inputs,
            missing => {
                let reason = missing.missing_reason().unwrap_or_default();
                warn!(drug = %drug, "{reason}, skipping");
                report.skipped.push(SkippedDrug { drug, reason });
                continue;
            }
        };

        match process_drug(job, embedder, &inputs).await? {
            DrugOutcome::Written(done) => report.processed.push(done),
            DrugOutcome::WriteFailed(failed) => report.failed.push(failed),
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        duration_ms = report.duration_ms,
        "All drugs processed"
    );
    Ok(report)
}

/// Embed, compare and write one drug's term lists.
///
/// Errors returned here halt the run; write failures come back as
/// [`DrugOutcome::WriteFailed`].
#[instrument(skip_all, fields(drug = %inputs.drug))]
pub async fn process_drug(
    job: &MappingJob,
    embedder: &dyn TextEmbedder,
    inputs: &DrugInputs,
) -> Result<DrugOutcome> {
    let predicted_terms = read_terms(&inputs.predicted, &job.term_column)?;
    let observed_terms = read_terms(&inputs.observed, &job.term_column)?;

    let predicted = embed_terms(embedder, &predicted_terms, "predicted").await?;
    let observed = embed_terms(embedder, &observed_terms, "observed").await?;

    let matrix = SimilarityMatrix::compute(&predicted, &observed)?;
    log_preview(&matrix, &predicted_terms, &observed_terms, job.preview);

    let model_dir = job.model_dir(embedder.model_name());
    let output = similarity_matrix_path(&model_dir, &inputs.drug, &job.predicted_dataset, &job.observed_dataset);

    let written = write_outputs(
        job,
        &model_dir,
        &inputs.drug,
        &output,
        &matrix,
        (predicted_terms.as_slice(), predicted.as_slice()),
        (observed_terms.as_slice(), observed.as_slice()),
    );

    match written {
        Ok(()) => {
            info!(path = %output.display(), "Similarity matrix saved");
            Ok(DrugOutcome::Written(ProcessedDrug {
                drug: inputs.drug.clone(),
                predicted_terms: predicted_terms.len(),
                observed_terms: observed_terms.len(),
                dimension: predicted.first().or(observed.first()).map_or(0, Vec::len),
                output,
            }))
        }
        Err(e) => {
            error!(error = %e, "Failed to write outputs, continuing with next drug");
            Ok(DrugOutcome::WriteFailed(FailedDrug {
                drug: inputs.drug.clone(),
                error: e.to_string(),
            }))
        }
    }
}

async fn embed_terms(embedder: &dyn TextEmbedder, terms: &[String], side: &str) -> Result<Vec<Vec<f32>>> {
    debug!("Calculating embeddings for {side} terms");
    let vectors = embedder.embed(terms).await?;
    if vectors.len() != terms.len() {
        return Err(EmbedError::CountMismatch {
            model: embedder.model_name().to_string(),
            expected: terms.len(),
            found: vectors.len(),
        }
        .into());
    }
    let dim = vectors.first().map_or(0, Vec::len);
    info!(side, n = terms.len(), dim, "Embeddings shape: ({}, {})", terms.len(), dim);
    Ok(vectors)
}

fn write_outputs(
    job: &MappingJob,
    model_dir: &Path,
    drug: &str,
    output: &Path,
    matrix: &SimilarityMatrix,
    predicted: (&[String], &[Vec<f32>]),
    observed: (&[String], &[Vec<f32>]),
) -> Result<()> {
    if job.save_embeddings {
        let path = embeddings_path(model_dir, drug, &job.predicted_dataset);
        write_embeddings_csv(&path, predicted.1, job.precision)?;
        let path = embeddings_path(model_dir, drug, &job.observed_dataset);
        write_embeddings_csv(&path, observed.1, job.precision)?;
    }
    write_similarity_csv(output, matrix, predicted.0, observed.0, job.precision)
}

fn log_preview(matrix: &SimilarityMatrix, predicted: &[String], observed: &[String], limit: usize) {
    let (rows, cols) = matrix.shape();
    for (i, p) in predicted.iter().enumerate().take(limit.min(rows)) {
        for (j, o) in observed.iter().enumerate().take(limit.min(cols)) {
            if let Some(score) = matrix.get(i, j) {
                info!("Similarity between '{}' and '{}': {:.4}", p, o, score);
            }
        }
    }
}
