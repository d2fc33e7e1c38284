//! Pairwise cosine similarity between two embedded term lists.

use crate::error::{OntomapError, Result};

/// Cosine similarity of two equal-length vectors.
///
/// A zero-magnitude vector scores 0 instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, b, norm(a), norm(b))
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_with_norms(a: &[f32], b: &[f32], norm_a: f32, norm_b: f32) -> f32 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    // Rounding can land a hair outside [-1, 1].
    (dot / denom).clamp(-1.0, 1.0)
}

/// Dense row-major `rows × cols` matrix of similarity scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Score every row of `left` against every row of `right`.
    ///
    /// All vectors on both sides must share one dimension. Either side may be
    /// empty, giving a matrix with zero rows or zero columns.
    pub fn compute(left: &[Vec<f32>], right: &[Vec<f32>]) -> Result<Self> {
        let dim = left.first().or(right.first()).map(Vec::len);
        if let Some(dim) = dim {
            check_dimension(left, dim, "predicted")?;
            check_dimension(right, dim, "observed")?;
        }

        let right_norms: Vec<f32> = right.iter().map(|v| norm(v)).collect();
        let mut values = Vec::with_capacity(left.len() * right.len());
        for a in left {
            let norm_a = norm(a);
            for (b, &norm_b) in right.iter().zip(&right_norms) {
                values.push(cosine_with_norms(a, b, norm_a, norm_b));
            }
        }

        Ok(Self {
            rows: left.len(),
            cols: right.len(),
            values,
        })
    }

    /// Build from explicit values, e.g. when reading a matrix back from disk.
    pub fn from_rows(rows: Vec<Vec<f32>>, cols: usize) -> Option<Self> {
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.rows && col < self.cols).then(|| self.values[row * self.cols + col])
    }

    /// Scores of one predicted term against every observed term.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| self.row_slice(row))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.rows).map(move |r| self.row_slice(r))
    }

    fn row_slice(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

fn check_dimension(vectors: &[Vec<f32>], expected: usize, side: &str) -> Result<()> {
    match vectors.iter().enumerate().find(|(_, v)| v.len() != expected) {
        Some((i, v)) => Err(OntomapError::DimensionMismatch {
            expected,
            found: v.len(),
            context: format!("{side} row {i}"),
        }),
        None => Ok(()),
    }
}
