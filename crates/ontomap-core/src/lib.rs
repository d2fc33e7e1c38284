//! ontomap-core: outcome-term similarity matrices per drug.
//!
//! Reads predicted and observed outcome terms from each drug folder, embeds
//! them with a [`ontomap_embed::TextEmbedder`] and writes the pairwise cosine
//! similarity matrix as a labelled CSV.

pub mod error;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod similarity;
pub mod terms;

pub use error::{OntomapError, Result};
pub use output::{read_similarity_csv, write_similarity_csv, LabeledMatrix};
pub use pipeline::{run_mapping, MappingJob, MappingReport};
pub use resolver::{discover_drug_dirs, resolve_drug, DrugInputs, Resolution};
pub use similarity::{cosine_similarity, SimilarityMatrix};
pub use terms::read_terms;
