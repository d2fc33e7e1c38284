//! Drug folder discovery and input-file matching.
//!
//! Layout: `<input_dir>/<drug>/*<predicted>.csv` and `*<observed>.csv`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{OntomapError, Result};

/// The two input files found for one drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugInputs {
    pub drug: String,
    pub predicted: PathBuf,
    pub observed: PathBuf,
}

/// Outcome of matching one drug folder against the dataset suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ready(DrugInputs),
    Missing {
        drug: String,
        predicted: bool,
        observed: bool,
    },
}

impl Resolution {
    /// Human-readable reason for a skip, `None` when ready.
    pub fn missing_reason(&self) -> Option<String> {
        match self {
            Resolution::Ready(_) => None,
            Resolution::Missing { predicted, observed, .. } => Some(
                match (predicted, observed) {
                    (true, true) => "missing predicted and observed files",
                    (true, false) => "missing predicted file",
                    _ => "missing observed file",
                }
                .to_string(),
            ),
        }
    }
}

/// OS metadata entries (`.DS_Store`, `._foo`, `.Trash`) start with a dot.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Sorted file names of the plain files directly inside `dir`.
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| OntomapError::io(dir, e))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| OntomapError::io(dir, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = ?entry.path(), "Skipping entry with non UTF-8 name");
            continue;
        };
        out.push((name, entry.path()));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

/// Immediate sub-directories of `input_dir`, sorted by name.
///
/// Regular files and hidden entries are skipped.
pub fn discover_drug_dirs(input_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let drugs: Vec<(String, PathBuf)> = sorted_entries(input_dir)?
        .into_iter()
        .filter(|(name, path)| !is_hidden(name) && path.is_dir())
        .collect();
    debug!(dir = %input_dir.display(), n = drugs.len(), "Discovered drug folders");
    Ok(drugs)
}

/// Match the predicted and observed files inside one drug folder.
///
/// Names are visited in sorted order and the first match per suffix wins.
/// A file matching the predicted suffix is never taken as the observed one.
pub fn resolve_drug(
    drug: &str,
    dir: &Path,
    predicted_suffix: &str,
    observed_suffix: &str,
) -> Result<Resolution> {
    let mut predicted: Option<PathBuf> = None;
    let mut observed: Option<PathBuf> = None;

    for (name, path) in sorted_entries(dir)? {
        if is_hidden(&name) || !path.is_file() {
            continue;
        }
        if name.ends_with(predicted_suffix) {
            match &predicted {
                None => predicted = Some(path),
                Some(kept) => warn!(drug, kept = %kept.display(), ignored = %name, "Multiple predicted files"),
            }
        } else if name.ends_with(observed_suffix) {
            match &observed {
                None => observed = Some(path),
                Some(kept) => warn!(drug, kept = %kept.display(), ignored = %name, "Multiple observed files"),
            }
        }
    }

    Ok(match (predicted, observed) {
        (Some(predicted), Some(observed)) => Resolution::Ready(DrugInputs {
            drug: drug.to_string(),
            predicted,
            observed,
        }),
        (p, o) => Resolution::Missing {
            drug: drug.to_string(),
            predicted: p.is_none(),
            observed: o.is_none(),
        },
    })
}
