//! Square, symmetric gene × gene matrices.
//!
//! Correlation, adjacency, TOM and dissimilarity all share one shape: an
//! `n × n` symmetric matrix whose rows and columns follow the gene order of
//! the filtered expression matrix. [`GeneMatrix`] stores that shape with
//! the gene labels behind an [`Arc`], so every stage of a run shares a
//! single copy of the ordering and can never re-sort it.

use std::sync::Arc;

use coexnet_core::{CoexnetError, LabeledMatrix, Result, Summarizable};

/// A dense, row-major, symmetric gene × gene matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneMatrix {
    data: Vec<f64>,
    n: usize,
    labels: Arc<[String]>,
}

impl GeneMatrix {
    /// Wrap row-major `data`, checking shape, symmetry and finiteness.
    pub fn from_vec(labels: Arc<[String]>, data: Vec<f64>) -> Result<Self> {
        let n = labels.len();
        if data.len() != n * n {
            return Err(CoexnetError::InvalidInput(format!(
                "GeneMatrix: data length ({}) != {n}x{n}",
                data.len()
            )));
        }
        for i in 0..n {
            for j in i..n {
                let (a, b) = (data[i * n + j], data[j * n + i]);
                if !a.is_finite() || !b.is_finite() {
                    return Err(CoexnetError::NumericDegeneracy(format!(
                        "GeneMatrix: non-finite value at ({i}, {j})"
                    )));
                }
                if a != b {
                    return Err(CoexnetError::InvalidInput(format!(
                        "GeneMatrix: asymmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }
        Ok(Self { data, n, labels })
    }

    /// Assemble a matrix from its strict upper triangle.
    ///
    /// `upper[i]` holds the values for columns `i+1..n` of row `i`; each is
    /// mirrored below the diagonal and the diagonal is set to `diagonal`.
    pub fn from_upper(labels: Arc<[String]>, diagonal: f64, upper: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();
        if upper.len() != n {
            return Err(CoexnetError::InvalidInput(format!(
                "GeneMatrix: {} upper rows for {n} labels",
                upper.len()
            )));
        }
        let mut data = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            if row.len() != n - i - 1 {
                return Err(CoexnetError::InvalidInput(format!(
                    "GeneMatrix: upper row {i} has {} values, expected {}",
                    row.len(),
                    n - i - 1
                )));
            }
            data[i * n + i] = diagonal;
            for (offset, v) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                data[i * n + j] = v;
                data[j * n + i] = v;
            }
        }
        Ok(Self { data, n, labels })
    }

    /// Element-wise transform of the off-diagonal, with a fixed diagonal.
    ///
    /// Symmetry is preserved because `f` sees each unordered pair's value
    /// once and the result is mirrored.
    pub fn map_off_diagonal<F>(&self, diagonal: f64, f: F) -> GeneMatrix
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let n = self.n;
        let upper_row = |i: usize| -> Vec<f64> {
            ((i + 1)..n).map(|j| f(self.data[i * n + j])).collect()
        };

        #[cfg(feature = "parallel")]
        let upper: Vec<Vec<f64>> = {
            use rayon::prelude::*;
            (0..n).into_par_iter().map(upper_row).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let upper: Vec<Vec<f64>> = (0..n).map(upper_row).collect();

        let mut data = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            data[i * n + i] = diagonal;
            for (offset, v) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                data[i * n + j] = v;
                data[j * n + i] = v;
            }
        }
        GeneMatrix {
            data,
            n,
            labels: Arc::clone(&self.labels),
        }
    }

    /// Value at `(i, j)`. Panics when out of bounds, like slice indexing.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// One row as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Number of genes (rows = columns).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Gene labels in row/column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Shared handle to the gene ordering.
    pub fn labels_arc(&self) -> Arc<[String]> {
        Arc::clone(&self.labels)
    }

    /// The underlying flat data (row-major, n × n).
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Smallest and largest value, or `None` for an empty matrix.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        if self.data.is_empty() {
            return None;
        }
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in &self.data {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        Some((lo, hi))
    }
}

impl LabeledMatrix for GeneMatrix {
    fn row_labels(&self) -> &[String] {
        &self.labels
    }

    fn col_labels(&self) -> &[String] {
        &self.labels
    }

    fn value(&self, i: usize, j: usize) -> f64 {
        self.get(i, j)
    }
}

impl Summarizable for GeneMatrix {
    fn summary(&self) -> String {
        format!("GeneMatrix: {}x{}", self.n, self.n)
    }
}
