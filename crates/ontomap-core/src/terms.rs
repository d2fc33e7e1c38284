//! Reading outcome terms from a dataset CSV.

use std::path::Path;

use tracing::debug;

use crate::error::{OntomapError, Result};

/// Read one column of `path` into an ordered list of terms.
///
/// Every data row contributes exactly one term, in file order. Duplicates and
/// empty cells are kept because row position indexes the similarity matrix.
/// Rows shorter than the header yield an empty term.
pub fn read_terms(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| OntomapError::csv(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| OntomapError::csv(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| OntomapError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
            available: headers.clone(),
        })?;

    let mut terms = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| OntomapError::csv(path, e))?;
        terms.push(record.get(index).unwrap_or_default().to_string());
    }

    debug!(path = %path.display(), n = terms.len(), "Read terms");
    Ok(terms)
}
