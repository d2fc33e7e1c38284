//! Similarity-matrix and embedding CSV output.
//!
//! Matrix layout: the header row is an empty cell followed by the observed
//! terms; each data row is a predicted term followed by its scores.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{OntomapError, Result};
use crate::similarity::SimilarityMatrix;

/// `<model_dir>/<drug>/<drug>_<predicted>_<observed>_similarity_matrix.csv`
pub fn similarity_matrix_path(model_dir: &Path, drug: &str, predicted: &str, observed: &str) -> PathBuf {
    model_dir
        .join(drug)
        .join(format!("{drug}_{predicted}_{observed}_similarity_matrix.csv"))
}

/// `<model_dir>/<drug>/<drug>_<dataset>_embeddings.csv`
pub fn embeddings_path(model_dir: &Path, drug: &str, dataset: &str) -> PathBuf {
    model_dir.join(drug).join(format!("{drug}_{dataset}_embeddings.csv"))
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| OntomapError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn format_value(value: f32, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Write `matrix` labelled by `row_labels` × `col_labels`, replacing any existing file.
pub fn write_similarity_csv(
    path: &Path,
    matrix: &SimilarityMatrix,
    row_labels: &[String],
    col_labels: &[String],
    precision: usize,
) -> Result<()> {
    let (rows, cols) = matrix.shape();
    if rows != row_labels.len() || cols != col_labels.len() {
        return Err(OntomapError::MalformedMatrix {
            path: path.to_path_buf(),
            reason: format!(
                "matrix is {rows}x{cols} but labels are {}x{}",
                row_labels.len(),
                col_labels.len()
            ),
        });
    }

    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| OntomapError::csv(path, e))?;

    let header = std::iter::once("").chain(col_labels.iter().map(String::as_str));
    writer.write_record(header).map_err(|e| OntomapError::csv(path, e))?;

    let mut record: Vec<String> = Vec::with_capacity(cols + 1);
    for (label, scores) in row_labels.iter().zip(matrix.rows()) {
        record.clear();
        record.push(label.clone());
        record.extend(scores.iter().map(|&v| format_value(v, precision)));
        writer.write_record(&record).map_err(|e| OntomapError::csv(path, e))?;
    }

    writer.flush().map_err(|e| OntomapError::io(path, e))?;
    debug!(path = %path.display(), rows, cols, "Wrote similarity matrix");
    Ok(())
}

/// A similarity matrix read back from disk together with its labels.
#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub matrix: SimilarityMatrix,
}

/// Read a file produced by [`write_similarity_csv`].
pub fn read_similarity_csv(path: &Path) -> Result<LabeledMatrix> {
    let malformed = |reason: String| OntomapError::MalformedMatrix {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| OntomapError::csv(path, e))?;

    let col_labels: Vec<String> = reader
        .headers()
        .map_err(|e| OntomapError::csv(path, e))?
        .iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let mut row_labels = Vec::new();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| OntomapError::csv(path, e))?;
        let mut fields = record.iter();
        row_labels.push(fields.next().unwrap_or_default().to_string());
        let values = fields
            .map(|f| f.parse::<f32>())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| malformed(format!("row {line}: {e}")))?;
        rows.push(values);
    }

    let matrix = SimilarityMatrix::from_rows(rows, col_labels.len())
        .ok_or_else(|| malformed("row width differs from header".to_string()))?;

    Ok(LabeledMatrix {
        row_labels,
        col_labels,
        matrix,
    })
}

/// One comma-separated row per vector, no header.
pub fn write_embeddings_csv(path: &Path, embeddings: &[Vec<f32>], precision: usize) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| OntomapError::csv(path, e))?;

    for vector in embeddings {
        writer
            .write_record(vector.iter().map(|&v| format_value(v, precision)))
            .map_err(|e| OntomapError::csv(path, e))?;
    }
    writer.flush().map_err(|e| OntomapError::io(path, e))?;
    debug!(path = %path.display(), n = embeddings.len(), "Wrote embeddings");
    Ok(())
}
