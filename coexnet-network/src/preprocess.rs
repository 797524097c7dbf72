//! Expression preprocessing: raw counts → filtered log2(TPM+1) matrix.
//!
//! 1. Genes without a length are dropped; the rest are TPM-normalized
//!    and transformed with `log2(TPM + 1)`.
//! 2. Low-expression filter: a gene is dropped when the fraction of
//!    samples below `expression_floor` is at least
//!    `low_expression_threshold`.
//! 3. Low-variance filter: genes whose variance falls strictly below the
//!    `low_variance_percentile` quantile are dropped. When that quantile is
//!    zero, every constant gene is dropped rather than kept as a tie. With
//!    fewer than [`MIN_GENES_FOR_VARIANCE_FILTER`] genes, or a percentile
//!    of 0, the filter is skipped.
//! 4. Under [`ZeroVariancePolicy::Exclude`], constant genes are removed.
//!
//! Gene order is preserved throughout. The percentile is resolved into an
//! absolute cutoff on the first pass and recorded, so refiltering the
//! output with [`PreprocessReport::thresholds`] removes nothing.

use coexnet_core::{CoexnetError, Result, Summarizable};
use coexnet_omics::{ExpressionMatrix, LengthTable};
use coexnet_stats::{is_constant, library_sizes, quantile, tpm, variance};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{NetworkConfig, ZeroVariancePolicy};

/// Below this many genes a percentile cut is meaningless and skipped.
pub const MIN_GENES_FOR_VARIANCE_FILTER: usize = 4;

/// Absolute filter parameters, reusable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterThresholds {
    pub expression_floor: f64,
    pub low_expression_threshold: f64,
    /// Minimum variance kept; `None` disables the variance filter.
    pub variance_cutoff: Option<f64>,
}

/// Gene counts removed at each preprocessing step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessReport {
    pub input_genes: usize,
    pub input_samples: usize,
    pub dropped_missing_length: usize,
    pub dropped_low_expression: usize,
    pub dropped_low_variance: usize,
    pub dropped_zero_variance: usize,
    pub expression_floor: f64,
    pub low_expression_threshold: f64,
    /// Variance cutoff actually applied (absent when the filter was skipped).
    pub variance_cutoff: Option<f64>,
    pub retained_genes: usize,
}

impl PreprocessReport {
    /// The thresholds this pass applied, for [`Preprocessor::refilter`].
    pub fn thresholds(&self) -> FilterThresholds {
        FilterThresholds {
            expression_floor: self.expression_floor,
            low_expression_threshold: self.low_expression_threshold,
            variance_cutoff: self.variance_cutoff,
        }
    }
}

impl Summarizable for PreprocessReport {
    fn summary(&self) -> String {
        format!(
            "{} of {} genes kept (no length: {}, low expression: {}, low variance: {}, zero variance: {})",
            self.retained_genes,
            self.input_genes,
            self.dropped_missing_length,
            self.dropped_low_expression,
            self.dropped_low_variance,
            self.dropped_zero_variance,
        )
    }
}

/// A filtered matrix and the record of how it was produced.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub matrix: ExpressionMatrix,
    pub report: PreprocessReport,
}

/// How the variance filter decides its cutoff.
#[derive(Debug, Clone, Copy)]
enum VarianceCut {
    Percentile(f64),
    Absolute(Option<f64>),
}

/// Normalizes and filters raw count matrices under one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor<'a> {
    config: &'a NetworkConfig,
}

impl<'a> Preprocessor<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self { config }
    }

    /// Normalize `counts` with `lengths` and apply all filters.
    pub fn run(&self, counts: &ExpressionMatrix, lengths: &LengthTable) -> Result<Preprocessed> {
        self.config.validate()?;
        let (n_genes, n_samples) = counts.shape();
        if n_genes == 0 || n_samples == 0 {
            return Err(CoexnetError::InvalidInput(format!(
                "preprocess: empty count matrix ({n_genes}x{n_samples})"
            )));
        }
        let mut report = PreprocessReport {
            input_genes: n_genes,
            input_samples: n_samples,
            expression_floor: self.config.expression_floor,
            low_expression_threshold: self.config.low_expression_threshold,
            ..Default::default()
        };

        let normalized = self.normalize(counts, lengths, &mut report)?;
        let matrix = self.filter(
            normalized,
            &mut report,
            self.config.expression_floor,
            self.config.low_expression_threshold,
            VarianceCut::Percentile(self.config.low_variance_percentile),
        )?;

        info!("{}", report.summary());
        Ok(Preprocessed { matrix, report })
    }

    /// Apply the filters of a previous pass to an already normalized matrix.
    pub fn refilter(
        &self,
        matrix: &ExpressionMatrix,
        thresholds: &FilterThresholds,
    ) -> Result<Preprocessed> {
        let (n_genes, n_samples) = matrix.shape();
        let mut report = PreprocessReport {
            input_genes: n_genes,
            input_samples: n_samples,
            expression_floor: thresholds.expression_floor,
            low_expression_threshold: thresholds.low_expression_threshold,
            ..Default::default()
        };
        let matrix = self.filter(
            matrix.clone(),
            &mut report,
            thresholds.expression_floor,
            thresholds.low_expression_threshold,
            VarianceCut::Absolute(thresholds.variance_cutoff),
        )?;
        debug!("refilter: {}", report.summary());
        Ok(Preprocessed { matrix, report })
    }

    fn normalize(
        &self,
        counts: &ExpressionMatrix,
        lengths: &LengthTable,
        report: &mut PreprocessReport,
    ) -> Result<ExpressionMatrix> {
        let mut keep = Vec::with_capacity(counts.shape().0);
        let mut lengths_kb = Vec::with_capacity(counts.shape().0);
        for (i, gene) in counts.feature_names().iter().enumerate() {
            match lengths.require(gene) {
                Ok(kb) => {
                    keep.push(i);
                    lengths_kb.push(kb);
                }
                Err(CoexnetError::MissingAnnotation { gene }) => {
                    debug!(gene = %gene, "no length, dropped");
                    report.dropped_missing_length += 1;
                }
                Err(e) => return Err(e),
            }
        }
        if report.dropped_missing_length > 0 {
            warn!(
                genes = report.dropped_missing_length,
                "genes without an annotated length were dropped"
            );
        }
        if keep.is_empty() {
            return Err(CoexnetError::DegenerateFilter {
                step: "missing-length".into(),
                input: report.input_genes,
            });
        }

        let annotated = counts.filter_features(&keep)?;
        let (n_genes, n_samples) = annotated.shape();

        let libs = library_sizes(annotated.as_slice(), n_genes, n_samples)?;
        if let Some(j) = libs.iter().position(|&s| s <= 0.0) {
            return Err(CoexnetError::InvalidSample {
                sample: annotated.sample_names()[j].clone(),
                reason: "library size is zero, TPM undefined".into(),
            });
        }

        let values = tpm(annotated.as_slice(), n_genes, n_samples, &lengths_kb)?;
        let tpm_matrix = ExpressionMatrix::from_flat(
            values,
            annotated.feature_names().to_vec(),
            annotated.sample_names().to_vec(),
        )?;
        Ok(tpm_matrix.log_transform(1.0))
    }

    fn filter(
        &self,
        matrix: ExpressionMatrix,
        report: &mut PreprocessReport,
        floor: f64,
        threshold: f64,
        cut: VarianceCut,
    ) -> Result<ExpressionMatrix> {
        // Low expression.
        let before = matrix.shape().0;
        let n_samples = matrix.shape().1 as f64;
        let expressed: Vec<usize> = matrix
            .rows()
            .enumerate()
            .filter(|(_, row)| {
                let silent = row.iter().filter(|&&v| v < floor).count() as f64;
                silent / n_samples < threshold
            })
            .map(|(i, _)| i)
            .collect();
        report.dropped_low_expression = before - expressed.len();
        if expressed.is_empty() {
            return Err(CoexnetError::DegenerateFilter {
                step: "low-expression".into(),
                input: before,
            });
        }
        let matrix = matrix.filter_features(&expressed)?;
        debug!(dropped = report.dropped_low_expression, "low-expression filter");

        // Low variance.
        let before = matrix.shape().0;
        let variances: Vec<f64> = matrix
            .rows()
            .map(|row| if is_constant(row) { Ok(0.0) } else { variance(row, 0) })
            .collect::<Result<_>>()?;
        let cutoff = match cut {
            VarianceCut::Absolute(cutoff) => cutoff,
            VarianceCut::Percentile(_) if before < MIN_GENES_FOR_VARIANCE_FILTER => {
                debug!(genes = before, "too few genes, variance filter skipped");
                None
            }
            VarianceCut::Percentile(q) if q <= 0.0 => None,
            VarianceCut::Percentile(q) => {
                let max = variances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                // Interpolation can overshoot a run of equal values by an ulp.
                Some(quantile(&variances, q)?.min(max))
            }
        };
        report.variance_cutoff = cutoff;
        let matrix = match cutoff {
            Some(cutoff) => {
                let varied: Vec<usize> = variances
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| passes_variance(v, cutoff))
                    .map(|(i, _)| i)
                    .collect();
                report.dropped_low_variance = before - varied.len();
                if varied.is_empty() {
                    return Err(CoexnetError::DegenerateFilter {
                        step: "low-variance".into(),
                        input: before,
                    });
                }
                debug!(cutoff, dropped = report.dropped_low_variance, "low-variance filter");
                matrix.filter_features(&varied)?
            }
            None => matrix,
        };

        // Zero variance.
        let matrix = match self.config.zero_variance {
            ZeroVariancePolicy::ZeroCorrelation => matrix,
            ZeroVariancePolicy::Exclude => {
                let before = matrix.shape().0;
                let varying: Vec<usize> = matrix
                    .rows()
                    .enumerate()
                    .filter(|(_, row)| !is_constant(row))
                    .map(|(i, _)| i)
                    .collect();
                report.dropped_zero_variance = before - varying.len();
                if varying.is_empty() {
                    return Err(CoexnetError::DegenerateFilter {
                        step: "zero-variance".into(),
                        input: before,
                    });
                }
                matrix.filter_features(&varying)?
            }
        };

        report.retained_genes = matrix.shape().0;
        Ok(matrix)
    }
}

/// Ties at a positive cutoff are kept; a zero cutoff still drops flat genes.
fn passes_variance(v: f64, cutoff: f64) -> bool {
    if cutoff > 0.0 {
        v >= cutoff
    } else {
        v > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn counts(rows: Vec<Vec<f64>>) -> ExpressionMatrix {
        let n = rows.len();
        let m = rows[0].len();
        ExpressionMatrix::new(rows, names("G", n), names("S", m)).unwrap()
    }

    fn unit_lengths(n: usize) -> LengthTable {
        LengthTable::from_lengths(names("G", n).into_iter().map(|g| (g, 1.0))).unwrap()
    }

    fn permissive() -> NetworkConfig {
        NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn silent_gene_dropped() {
        // 3 samples, 2 genes, the second never expressed.
        let config = NetworkConfig {
            low_expression_threshold: 0.5,
            ..Default::default()
        };
        let out = Preprocessor::new(&config)
            .run(&counts(vec![vec![10.0, 10.0, 10.0], vec![0.0, 0.0, 0.0]]), &unit_lengths(2))
            .unwrap();
        assert_eq!(out.matrix.shape(), (1, 3));
        assert_eq!(out.matrix.feature_names(), &["G0"]);
        assert_eq!(out.report.dropped_low_expression, 1);
        // Only gene: TPM = 1e6 everywhere.
        assert!((out.matrix.get(0, 0).unwrap() - (1e6_f64 + 1.0).log2()).abs() < TOL);
        // Two genes are too few for a percentile cut.
        assert_eq!(out.report.variance_cutoff, None);
    }

    #[test]
    fn log_tpm_values() {
        let config = permissive();
        let lengths = LengthTable::from_lengths([("G0", 1.0), ("G1", 2.0)]).unwrap();
        let out = Preprocessor::new(&config)
            .run(&counts(vec![vec![100.0, 30.0], vec![100.0, 60.0]]), &lengths)
            .unwrap();
        // Sample 0: RPK 100 and 50 → TPM 666666.67 and 333333.33.
        let expected = (1e6 * 2.0 / 3.0 + 1.0_f64).log2();
        assert!((out.matrix.get(0, 0).unwrap() - expected).abs() < TOL);
        // Sample 1: RPK 30 and 30 → 500000 each.
        assert!((out.matrix.get(0, 1).unwrap() - out.matrix.get(1, 1).unwrap()).abs() < TOL);
    }

    #[test]
    fn missing_length_dropped_and_counted() {
        let config = permissive();
        let lengths = LengthTable::from_lengths([("G0", 1.0), ("G2", 1.0)]).unwrap();
        let out = Preprocessor::new(&config)
            .run(
                &counts(vec![vec![5.0, 8.0], vec![1.0, 1.0], vec![9.0, 2.0]]),
                &lengths,
            )
            .unwrap();
        assert_eq!(out.report.dropped_missing_length, 1);
        assert_eq!(out.matrix.feature_names(), &["G0", "G2"]);
    }

    #[test]
    fn versioned_ids_resolve() {
        let config = permissive();
        let m = ExpressionMatrix::new(
            vec![vec![5.0, 8.0], vec![3.0, 1.0]],
            vec!["ENSG1.4".into(), "ENSG2".into()],
            names("S", 2),
        )
        .unwrap();
        let lengths = LengthTable::from_lengths([("ENSG1.7", 1.0), ("ENSG2.2", 2.0)]).unwrap();
        let out = Preprocessor::new(&config).run(&m, &lengths).unwrap();
        assert_eq!(out.report.dropped_missing_length, 0);
        assert_eq!(out.matrix.feature_names(), &["ENSG1.4", "ENSG2"]);
    }

    #[test]
    fn no_annotated_gene_is_degenerate() {
        let config = permissive();
        let lengths = LengthTable::from_lengths([("other", 1.0)]).unwrap();
        let err = Preprocessor::new(&config)
            .run(&counts(vec![vec![1.0, 2.0]]), &lengths)
            .unwrap_err();
        assert!(matches!(err, CoexnetError::DegenerateFilter { .. }));
    }

    #[test]
    fn zero_library_is_invalid_sample() {
        let config = permissive();
        let err = Preprocessor::new(&config)
            .run(&counts(vec![vec![3.0, 0.0], vec![4.0, 0.0]]), &unit_lengths(2))
            .unwrap_err();
        match err {
            CoexnetError::InvalidSample { sample, .. } => assert_eq!(sample, "S1"),
            other => panic!("expected InvalidSample, got {other:?}"),
        }
    }

    #[test]
    fn everything_silent_is_degenerate() {
        let config = NetworkConfig {
            low_expression_threshold: 0.5,
            expression_floor: 1e9,
            ..Default::default()
        };
        let err = Preprocessor::new(&config)
            .run(&counts(vec![vec![3.0, 1.0], vec![4.0, 2.0]]), &unit_lengths(2))
            .unwrap_err();
        match err {
            CoexnetError::DegenerateFilter { step, input } => {
                assert_eq!(step, "low-expression");
                assert_eq!(input, 2);
            }
            other => panic!("expected DegenerateFilter, got {other:?}"),
        }
    }

    fn varied_counts() -> ExpressionMatrix {
        // Eight genes with increasing spread across four samples.
        let rows = (0..8)
            .map(|i| {
                let spread = (i as f64) * 40.0;
                vec![500.0 + spread, 500.0 - spread / 2.0, 500.0, 500.0 + spread / 3.0]
            })
            .collect();
        counts(rows)
    }

    #[test]
    fn variance_filter_drops_bottom_quantile() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.25,
            ..Default::default()
        };
        let out = Preprocessor::new(&config).run(&varied_counts(), &unit_lengths(8)).unwrap();
        let cutoff = out.report.variance_cutoff.unwrap();
        assert!(cutoff > 0.0);
        assert!(out.report.dropped_low_variance >= 1);
        for row in out.matrix.rows() {
            assert!(variance(row, 0).unwrap() >= cutoff);
        }
        // Survivors keep their input order.
        let kept = out.matrix.feature_names();
        let mut sorted = kept.to_vec();
        sorted.sort_by_key(|g| g[1..].parse::<usize>().unwrap());
        assert_eq!(kept, sorted.as_slice());
    }

    #[test]
    fn variance_filter_skipped_below_minimum() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.9,
            ..Default::default()
        };
        let out = Preprocessor::new(&config)
            .run(
                &counts(vec![vec![5.0, 8.0, 1.0], vec![3.0, 1.0, 2.0], vec![4.0, 4.0, 9.0]]),
                &unit_lengths(3),
            )
            .unwrap();
        assert_eq!(out.report.dropped_low_variance, 0);
        assert_eq!(out.report.variance_cutoff, None);
        assert_eq!(out.matrix.shape().0, 3);
    }

    #[test]
    fn full_percentile_keeps_the_most_variable() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 1.0,
            ..Default::default()
        };
        let out = Preprocessor::new(&config).run(&varied_counts(), &unit_lengths(8)).unwrap();
        assert!(out.matrix.shape().0 >= 1);
    }

    #[test]
    fn equal_variances_survive_any_percentile() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.3,
            ..Default::default()
        };
        // Mirrored genes over equal libraries share one positive variance;
        // the cutoff equals it and ties are kept.
        let rows = vec![
            vec![10.0, 30.0],
            vec![30.0, 10.0],
            vec![10.0, 30.0],
            vec![30.0, 10.0],
        ];
        let out = Preprocessor::new(&config).run(&counts(rows), &unit_lengths(4)).unwrap();
        assert!(out.report.variance_cutoff.unwrap() > 0.0);
        assert_eq!(out.matrix.shape().0, 4);
    }

    #[test]
    fn flat_genes_tied_at_zero_cutoff_are_dropped() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.25,
            ..Default::default()
        };
        // Every sample has 1180 reads, so the three flat genes are exactly
        // constant after normalization and fill the bottom quartile.
        let rows = vec![
            vec![50.0, 150.0, 80.0, 120.0],
            vec![100.0, 100.0, 100.0, 100.0],
            vec![150.0, 50.0, 120.0, 80.0],
            vec![100.0, 100.0, 100.0, 100.0],
            vec![200.0, 400.0, 250.0, 350.0],
            vec![400.0, 200.0, 350.0, 250.0],
            vec![100.0, 100.0, 100.0, 100.0],
            vec![20.0, 60.0, 40.0, 40.0],
            vec![60.0, 20.0, 40.0, 40.0],
        ];
        let pre = Preprocessor::new(&config);
        let out = pre.run(&counts(rows), &unit_lengths(9)).unwrap();

        assert_eq!(out.report.variance_cutoff, Some(0.0));
        assert_eq!(out.report.dropped_low_variance, 3);
        assert_eq!(out.report.dropped_zero_variance, 0);
        assert_eq!(out.matrix.feature_names(), &["G0", "G2", "G4", "G5", "G7", "G8"]);
        assert!(out.matrix.rows().all(|row| !is_constant(row)));

        let again = pre.refilter(&out.matrix, &out.report.thresholds()).unwrap();
        assert_eq!(again.matrix, out.matrix);
    }

    #[test]
    fn zero_percentile_keeps_flat_genes() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.0,
            ..Default::default()
        };
        let rows = vec![
            vec![10.0, 30.0],
            vec![20.0, 20.0],
            vec![30.0, 10.0],
            vec![20.0, 20.0],
        ];
        let out = Preprocessor::new(&config).run(&counts(rows), &unit_lengths(4)).unwrap();
        assert_eq!(out.report.variance_cutoff, None);
        assert_eq!(out.matrix.shape().0, 4);
    }

    #[test]
    fn variance_filter_applies_at_minimum() {
        let config = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.5,
            ..Default::default()
        };
        let rows = (0..MIN_GENES_FOR_VARIANCE_FILTER)
            .map(|i| {
                let spread = (i as f64 + 1.0) * 60.0;
                vec![500.0 + spread, 500.0 - spread / 2.0, 500.0, 500.0 + spread / 3.0]
            })
            .collect();
        let out = Preprocessor::new(&config)
            .run(&counts(rows), &unit_lengths(MIN_GENES_FOR_VARIANCE_FILTER))
            .unwrap();
        assert!(out.report.variance_cutoff.is_some());
        assert!(out.report.dropped_low_variance >= 1);
    }

    #[test]
    fn refilter_is_idempotent() {
        let config = NetworkConfig::default();
        let pre = Preprocessor::new(&config);
        let first = pre.run(&varied_counts(), &unit_lengths(8)).unwrap();
        let second = pre.refilter(&first.matrix, &first.report.thresholds()).unwrap();
        assert_eq!(second.matrix, first.matrix);
        assert_eq!(second.report.dropped_low_expression, 0);
        assert_eq!(second.report.dropped_low_variance, 0);
        assert_eq!(second.report.dropped_zero_variance, 0);
    }

    #[test]
    fn zero_variance_policies() {
        // After TPM, equal counts in every sample give a constant row only if
        // the library sizes match; use two mirrored genes plus a flat one.
        let rows = vec![vec![10.0, 30.0], vec![30.0, 10.0], vec![20.0, 20.0]];

        let keep = NetworkConfig {
            low_expression_threshold: 1.0,
            low_variance_percentile: 0.0,
            ..Default::default()
        };
        let out = Preprocessor::new(&keep).run(&counts(rows.clone()), &unit_lengths(3)).unwrap();
        assert_eq!(out.matrix.shape().0, 3);
        assert!(is_constant(out.matrix.row(2).unwrap()));

        let exclude = NetworkConfig {
            zero_variance: ZeroVariancePolicy::Exclude,
            ..keep
        };
        let out = Preprocessor::new(&exclude).run(&counts(rows), &unit_lengths(3)).unwrap();
        assert_eq!(out.matrix.feature_names(), &["G0", "G1"]);
        assert_eq!(out.report.dropped_zero_variance, 1);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = NetworkConfig {
            low_variance_percentile: 2.0,
            ..Default::default()
        };
        assert!(Preprocessor::new(&config)
            .run(&counts(vec![vec![1.0, 2.0]]), &unit_lengths(1))
            .is_err());
    }
}
