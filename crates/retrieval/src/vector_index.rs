//! Vector index abstraction over catalog rows.
//!
//! Rows are identified by their position in the catalog. Scores are cosine
//! similarities, computed as inner products of unit vectors.

use medbill_core::{AppError, AppResult};

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensions every query vector must have.
    fn dimensions(&self) -> usize;

    /// Search for the most similar rows to `query`.
    ///
    /// Returns `(row, score)` pairs in descending score order; `top_k = None`
    /// scans and returns every row.
    fn search(&self, query: &[f32], top_k: Option<usize>) -> AppResult<Vec<(usize, f32)>>;
}

/// Scale a vector to unit length in place. Zero vectors are left as-is.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Exhaustive in-memory index: every search is a linear scan.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build from one vector per catalog row, normalizing each.
    pub fn build(dimensions: usize, vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        let mut vectors = vectors;
        for (row, vector) in vectors.iter_mut().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "Row {} has {} dimensions, index expects {}",
                    row,
                    vector.len(),
                    dimensions
                )));
            }
            normalize(vector);
        }

        Ok(Self {
            dimensions,
            vectors,
        })
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], top_k: Option<usize>) -> AppResult<Vec<(usize, f32)>> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Query has {} dimensions, index was built with {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, v)| (row, v.iter().zip(&query).map(|(a, b)| a * b).sum()))
            .collect();

        // Ties keep catalog order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        if let Some(k) = top_k {
            scored.truncate(k);
        }

        Ok(scored)
    }
}
