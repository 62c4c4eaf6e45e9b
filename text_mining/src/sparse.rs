//! Sparse vectors and column-major sparse matrices

use crate::error::{Result, TextError};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Vector storing only its nonzero entries, sorted by index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(index, value)` pairs in any order.
    ///
    /// Repeated indices are summed and zeros dropped.
    pub fn from_pairs(mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|&(idx, _)| idx);
        let mut entries: Vec<(usize, f64)> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match entries.last_mut() {
                Some(last) if last.0 == idx => last.1 += value,
                _ => entries.push((idx, value)),
            }
        }
        entries.retain(|&(_, value)| value != 0.0);
        Self { entries }
    }

    /// Number of nonzero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `idx`, zero when absent
    pub fn get(&self, idx: usize) -> f64 {
        self.entries
            .binary_search_by_key(&idx, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(idx, _)| idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Largest index plus one, zero for an empty vector
    pub fn min_dim(&self) -> usize {
        self.entries.last().map_or(0, |&(idx, _)| idx + 1)
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a) = self.entries[i];
            let (b_idx, b) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += a * b;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Dot product with a dense vector; entries beyond its length count as zero
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(idx, value)| dense.get(idx).map(|d| d * value))
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit L2 norm; an empty vector is left as is
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for entry in &mut self.entries {
                entry.1 /= norm;
            }
        }
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (idx, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{:.4}", idx, value)?;
        }
        write!(f, "]")
    }
}

/// Sparse matrix stored as columns, one column per document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseMatrix {
    rows: usize,
    columns: Vec<SparseVector>,
}

impl SparseMatrix {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn from_columns(rows: usize, columns: Vec<SparseVector>) -> Result<Self> {
        let mut matrix = Self::new(rows);
        for column in columns {
            matrix.push_column(column)?;
        }
        Ok(matrix)
    }

    /// Append a column; its indices must be below the row count
    pub fn push_column(&mut self, column: SparseVector) -> Result<()> {
        if column.min_dim() > self.rows {
            return Err(TextError::DimensionMismatch {
                expected: self.rows,
                got: column.min_dim(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Nonzero entries over all columns
    pub fn nnz(&self) -> usize {
        self.columns.iter().map(SparseVector::nnz).sum()
    }

    pub fn column(&self, j: usize) -> Option<&SparseVector> {
        self.columns.get(j)
    }

    pub fn columns(&self) -> &[SparseVector] {
        &self.columns
    }

    /// `Aᵀ·x`: the dot product of `x` with every column.
    ///
    /// With normalized columns and query this is the cosine similarity.
    pub fn multiply_t(&self, x: &SparseVector) -> Vec<f64> {
        self.columns.iter().map(|column| column.dot(x)).collect()
    }

    /// The `k` columns most similar to `query`, best first, as `(column, similarity)`
    pub fn nearest(&self, query: &SparseVector, k: usize) -> Vec<(usize, f64)> {
        let mut scored: Vec<(usize, f64)> =
            self.multiply_t(query).into_iter().enumerate().collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}
