//! End-to-end network construction.
//!
//! Stages run strictly in order, each consuming the previous stage's
//! complete output:
//!
//! ```text
//! counts + lengths → preprocess → correlation → adjacency → TOM → dissimilarity
//! ```
//!
//! Every matrix is handed to a [`MatrixSink`] as soon as it exists. Failing
//! to write the clean expression matrix or the dissimilarity matrix aborts
//! the run; the correlation, adjacency and TOM writes are diagnostic, so
//! their failures are logged and recorded in the [`PipelineReport`].

use coexnet_core::{
    CoexnetError, LabeledMatrix, MatrixSink, Result, Stage, StageContext, Summarizable,
};
use coexnet_omics::{ExpressionMatrix, LengthTable};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adjacency::soft_threshold;
use crate::config::NetworkConfig;
use crate::correlation::correlate;
use crate::dissimilarity::dissimilarity;
use crate::preprocess::{PreprocessReport, Preprocessor};
use crate::tom::topological_overlap;

/// Sink names of the five output matrices, in write order.
pub const CLEAN_MATRIX: &str = "clean_matrix";
pub const CORRELATION: &str = "correlation";
pub const ADJACENCY: &str = "adjacency";
pub const TOM_MATRIX: &str = "tom_matrix";
pub const DISSIMILARITY: &str = "dissimilarity";

/// A diagnostic matrix that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub matrix: String,
    pub error: String,
}

/// What a run did, for logging and the optional JSON report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub config: NetworkConfig,
    pub preprocess: PreprocessReport,
    /// Genes kept despite zero variance (correlation 0 with every other gene).
    pub zero_variance_genes: Vec<String>,
    pub clamped_tom_denominators: usize,
    pub final_genes: usize,
    pub write_failures: Vec<WriteFailure>,
}

impl PipelineReport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoexnetError::Other(format!("report serialization: {e}")))
    }
}

impl Summarizable for PipelineReport {
    fn summary(&self) -> String {
        format!(
            "network of {} genes from {} genes x {} samples ({} zero-variance, {} clamped TOM denominators, {} failed writes)",
            self.final_genes,
            self.preprocess.input_genes,
            self.preprocess.input_samples,
            self.zero_variance_genes.len(),
            self.clamped_tom_denominators,
            self.write_failures.len(),
        )
    }
}

/// Runs every stage under one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    config: &'a NetworkConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self { config }
    }

    /// Build the network from raw `counts`, writing each matrix to `sink`.
    ///
    /// A fatal failure is returned as [`CoexnetError::Stage`]
    /// naming the stage that failed.
    pub fn run(
        &self,
        counts: &ExpressionMatrix,
        lengths: &LengthTable,
        sink: &mut dyn MatrixSink,
    ) -> Result<PipelineReport> {
        let config = self.config;
        config.validate().at_stage(Stage::Preprocess)?;

        let mut report = PipelineReport {
            config: config.clone(),
            ..Default::default()
        };

        info!("{}", counts.summary());
        let pre = Preprocessor::new(config)
            .run(counts, lengths)
            .at_stage(Stage::Preprocess)?;
        report.preprocess = pre.report;
        report.final_genes = pre.matrix.shape().0;
        sink.write_matrix(CLEAN_MATRIX, &pre.matrix)
            .at_stage(Stage::Write)?;

        let correlation = correlate(&pre.matrix).at_stage(Stage::Correlation)?;
        drop(pre.matrix);
        report.zero_variance_genes = correlation.zero_variance;
        write_diagnostic(sink, CORRELATION, &correlation.matrix, &mut report);

        let adjacency = soft_threshold(&correlation.matrix, config.soft_power_beta)
            .at_stage(Stage::Adjacency)?;
        drop(correlation.matrix);
        write_diagnostic(sink, ADJACENCY, &adjacency, &mut report);

        let tom = topological_overlap(&adjacency, config.tom_epsilon).at_stage(Stage::Tom)?;
        drop(adjacency);
        report.clamped_tom_denominators = tom.clamped_denominators;
        write_diagnostic(sink, TOM_MATRIX, &tom.matrix, &mut report);

        let distance = dissimilarity(&tom.matrix).at_stage(Stage::Dissimilarity)?;
        drop(tom.matrix);
        sink.write_matrix(DISSIMILARITY, &distance)
            .at_stage(Stage::Write)?;

        info!("{}", report.summary());
        Ok(report)
    }
}

fn write_diagnostic(
    sink: &mut dyn MatrixSink,
    name: &str,
    matrix: &dyn LabeledMatrix,
    report: &mut PipelineReport,
) {
    if let Err(e) = sink.write_matrix(name, matrix) {
        warn!(matrix = name, error = %e, "could not write diagnostic matrix, continuing");
        report.write_failures.push(WriteFailure {
            matrix: name.to_string(),
            error: e.to_string(),
        });
    }
}
