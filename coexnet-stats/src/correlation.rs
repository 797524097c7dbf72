//! Correlation analysis.
//!
//! [`CorrelationMatrix`] computes pairwise Pearson coefficients for many
//! variables (genes) at once.

use coexnet_core::{CoexnetError, Result, Summarizable};

use crate::descriptive::is_constant;

/// Center `row` and scale it to unit Euclidean norm.
///
/// Returns `None` for a constant row, which has no direction to scale.
/// Constancy is checked on the raw values: the mean of identical values
/// can round away from them and leave a spurious non-zero residual.
fn standardize(row: &[f64]) -> Option<Vec<f64>> {
    if is_constant(row) {
        return None;
    }
    let n = row.len() as f64;
    let mean = row.iter().sum::<f64>() / n;
    let centered: Vec<f64> = row.iter().map(|&x| x - mean).collect();
    let norm = centered.iter().map(|d| d * d).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(centered.into_iter().map(|d| d / norm).collect())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ── Correlation matrix ─────────────────────────────────────────────────────

/// Pairwise Pearson correlation matrix for a set of variables.
///
/// Rows with zero variance have an undefined coefficient with everything;
/// they are assigned 0.0 off the diagonal and reported through
/// [`zero_variance`](Self::zero_variance). The diagonal is always 1.0.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    /// Flat storage (row-major, n×n).
    data: Vec<f64>,
    /// Number of variables.
    size: usize,
    /// Indices of constant rows.
    zero_variance: Vec<usize>,
}

impl CorrelationMatrix {
    /// Build a correlation matrix from rows of observations.
    ///
    /// Each inner slice is one variable's observations (all must have the same
    /// length and at least 2 elements). Rows are standardized once, so each
    /// coefficient is a single dot product.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(CoexnetError::InvalidInput(
                "CorrelationMatrix: need at least one variable".into(),
            ));
        }
        let obs_len = rows[0].len();
        if obs_len < 2 {
            return Err(CoexnetError::InvalidInput(
                "CorrelationMatrix: need at least 2 observations".into(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != obs_len {
                return Err(CoexnetError::InvalidInput(format!(
                    "CorrelationMatrix: row {} has {} observations, expected {}",
                    i,
                    row.len(),
                    obs_len,
                )));
            }
            if let Some(v) = row.iter().find(|v| !v.is_finite()) {
                return Err(CoexnetError::NumericDegeneracy(format!(
                    "CorrelationMatrix: row {i} contains {v}"
                )));
            }
        }

        let standardized: Vec<Option<Vec<f64>>> = rows.iter().map(|r| standardize(r)).collect();
        let zero_variance: Vec<usize> = standardized
            .iter()
            .enumerate()
            .filter_map(|(i, z)| z.is_none().then_some(i))
            .collect();

        let n = rows.len();
        let upper_row = |i: usize| -> Vec<f64> {
            ((i + 1)..n)
                .map(|j| match (&standardized[i], &standardized[j]) {
                    (Some(zi), Some(zj)) => dot(zi, zj).clamp(-1.0, 1.0),
                    _ => 0.0,
                })
                .collect()
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
            data[i * n + i] = 1.0;
            for (offset, r) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                data[i * n + j] = r;
                data[j * n + i] = r;
            }
        }

        Ok(Self {
            data,
            size: n,
            zero_variance,
        })
    }

    /// Get the correlation between variable `i` and variable `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Number of variables.
    pub fn n(&self) -> usize {
        self.size
    }

    /// Indices of the constant (zero-variance) rows.
    pub fn zero_variance(&self) -> &[usize] {
        &self.zero_variance
    }

    /// Consume the matrix, returning its row-major data.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}

impl Summarizable for CorrelationMatrix {
    fn summary(&self) -> String {
        format!("CorrelationMatrix: {}x{}", self.size, self.size)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
