//! Dense expression matrix for bulk omics data.
//!
//! [`ExpressionMatrix`] stores a row-major dense matrix of `f64` values
//! (n_features × n_samples) with associated feature and sample names.
//! It holds both raw RNA-seq counts and their normalized log2(TPM+1)
//! values; row order is significant and preserved by every subset.

use coexnet_core::{CoexnetError, LabeledMatrix, Result, Summarizable};

/// A dense, row-major expression matrix (features × samples).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    data: Vec<f64>,
    n_features: usize,
    n_samples: usize,
    feature_names: Vec<String>,
    sample_names: Vec<String>,
}

impl ExpressionMatrix {
    /// Create a matrix from row-major 2D data.
    ///
    /// Each inner `Vec` is one feature (row) with `n_samples` values.
    pub fn new(
        data: Vec<Vec<f64>>,
        feature_names: Vec<String>,
        sample_names: Vec<String>,
    ) -> Result<Self> {
        let n_features = data.len();
        let n_samples = sample_names.len();

        if feature_names.len() != n_features {
            return Err(CoexnetError::InvalidInput(format!(
                "feature_names length ({}) does not match row count ({n_features})",
                feature_names.len()
            )));
        }

        let mut flat = Vec::with_capacity(n_features * n_samples);
        for (i, row) in data.iter().enumerate() {
            if row.len() != n_samples {
                return Err(CoexnetError::InvalidInput(format!(
                    "row {i} has {} columns, expected {n_samples}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }

        Ok(Self {
            data: flat,
            n_features,
            n_samples,
            feature_names,
            sample_names,
        })
    }

    /// Create a matrix from flat row-major data.
    pub fn from_flat(
        data: Vec<f64>,
        feature_names: Vec<String>,
        sample_names: Vec<String>,
    ) -> Result<Self> {
        let n_features = feature_names.len();
        let n_samples = sample_names.len();
        if data.len() != n_features * n_samples {
            return Err(CoexnetError::InvalidInput(format!(
                "data length ({}) != n_features ({n_features}) * n_samples ({n_samples})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            n_features,
            n_samples,
            feature_names,
            sample_names,
        })
    }

    /// (n_features, n_samples).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_features, self.n_samples)
    }

    /// Get a single value by feature and sample index.
    pub fn get(&self, feature_idx: usize, sample_idx: usize) -> Option<f64> {
        if feature_idx < self.n_features && sample_idx < self.n_samples {
            Some(self.data[feature_idx * self.n_samples + sample_idx])
        } else {
            None
        }
    }

    /// A slice of one feature's expression across all samples.
    pub fn row(&self, feature_idx: usize) -> Option<&[f64]> {
        if feature_idx < self.n_features {
            let start = feature_idx * self.n_samples;
            Some(&self.data[start..start + self.n_samples])
        } else {
            None
        }
    }

    /// Iterate over feature rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let width = self.n_samples;
        (0..self.n_features).map(move |i| &self.data[i * width..(i + 1) * width])
    }

    /// Subset the matrix to the given feature (row) indices, in the given order.
    pub fn filter_features(&self, indices: &[usize]) -> Result<ExpressionMatrix> {
        let mut data = Vec::with_capacity(indices.len() * self.n_samples);
        let mut names = Vec::with_capacity(indices.len());

        for &i in indices {
            if i >= self.n_features {
                return Err(CoexnetError::InvalidInput(format!(
                    "feature index {i} out of bounds (n_features={})",
                    self.n_features
                )));
            }
            let start = i * self.n_samples;
            data.extend_from_slice(&self.data[start..start + self.n_samples]);
            names.push(self.feature_names[i].clone());
        }

        Ok(ExpressionMatrix {
            data,
            n_features: indices.len(),
            n_samples: self.n_samples,
            feature_names: names,
            sample_names: self.sample_names.clone(),
        })
    }

    /// The underlying flat data as a slice (row-major, n_features × n_samples).
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Feature (gene) names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Sample names.
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    /// Log2-transform all values: `log2(x + pseudocount)`.
    pub fn log_transform(&self, pseudocount: f64) -> ExpressionMatrix {
        let data: Vec<f64> = self
            .data
            .iter()
            .map(|&x| (x + pseudocount).log2())
            .collect();
        ExpressionMatrix {
            data,
            n_features: self.n_features,
            n_samples: self.n_samples,
            feature_names: self.feature_names.clone(),
            sample_names: self.sample_names.clone(),
        }
    }
}

impl LabeledMatrix for ExpressionMatrix {
    fn row_labels(&self) -> &[String] {
        &self.feature_names
    }

    fn col_labels(&self) -> &[String] {
        &self.sample_names
    }

    fn value(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n_samples + j]
    }
}

impl Summarizable for ExpressionMatrix {
    fn summary(&self) -> String {
        format!(
            "ExpressionMatrix: {} features \u{00d7} {} samples",
            self.n_features, self.n_samples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> ExpressionMatrix {
        ExpressionMatrix::new(
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            vec!["gene1".into(), "gene2".into()],
            vec!["s1".into(), "s2".into(), "s3".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_construction() {
        let m = sample_matrix();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), Some(6.0));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = ExpressionMatrix::new(
            vec![vec![1.0, 2.0]],
            vec!["gene1".into(), "gene2".into()], // 2 names, 1 row
            vec!["s1".into(), "s2".into()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_row_length_mismatch() {
        let result = ExpressionMatrix::new(
            vec![vec![1.0, 2.0], vec![3.0]],
            vec!["gene1".into(), "gene2".into()],
            vec!["s1".into(), "s2".into()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_flat() {
        let m = ExpressionMatrix::from_flat(
            vec![1.0, 2.0, 3.0, 4.0],
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into()],
        )
        .unwrap();
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert!(ExpressionMatrix::from_flat(vec![1.0], vec!["a".into()], vec![]).is_err());
    }

    #[test]
    fn test_rows_iter() {
        let m = sample_matrix();
        let rows: Vec<&[f64]> = m.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]);

        let no_samples = ExpressionMatrix::from_flat(vec![], vec!["a".into()], vec![]).unwrap();
        assert_eq!(no_samples.rows().count(), 1);
    }

    #[test]
    fn test_filter_features_preserves_order() {
        let m = sample_matrix();
        let filtered = m.filter_features(&[1]).unwrap();
        assert_eq!(filtered.shape(), (1, 3));
        assert_eq!(filtered.get(0, 0), Some(4.0));
        assert_eq!(filtered.feature_names(), &["gene2"]);
        assert_eq!(filtered.sample_names(), m.sample_names());

        assert!(m.filter_features(&[5]).is_err());
    }

    #[test]
    fn test_log_transform() {
        let logged = sample_matrix().log_transform(1.0);
        // log2(1.0 + 1.0) = 1.0
        assert!((logged.get(0, 0).unwrap() - 1.0).abs() < 1e-10);
        assert!((logged.get(1, 0).unwrap() - 5.0_f64.log2()).abs() < 1e-10);
    }

    #[test]
    fn test_labeled_matrix() {
        let m = sample_matrix();
        assert_eq!(LabeledMatrix::shape(&m), (2, 3));
        assert_eq!(m.row_labels(), &["gene1", "gene2"]);
        assert_eq!(m.col_labels(), &["s1", "s2", "s3"]);
        assert_eq!(m.value(1, 1), 5.0);
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            sample_matrix().summary(),
            "ExpressionMatrix: 2 features \u{00d7} 3 samples"
        );
    }

    #[test]
    fn test_empty_matrix() {
        let m = ExpressionMatrix::new(vec![], vec![], vec!["s1".into()]).unwrap();
        assert_eq!(m.shape(), (0, 1));
    }
}
