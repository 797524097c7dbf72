//! Command-line front end for the coexnet pipeline.
//!
//! [`Cli`] maps flags onto a [`NetworkConfig`]; [`run`] loads the inputs,
//! runs the pipeline into CSV files and writes the optional JSON report.

use std::path::PathBuf;

use clap::Parser;
use coexnet_core::{CoexnetError, Result, Stage, StageContext, Summarizable};
use coexnet_io::{read_gct, read_length_table, CsvSink};
use coexnet_network::{NetworkConfig, Pipeline, PipelineReport, ZeroVariancePolicy};
use coexnet_omics::LengthPolicy;
use tracing::info;

/// Build a weighted gene co-expression network (WGCNA-style) from a GTEx
/// read-count table and a GTF annotation.
///
/// Writes <OUT>_clean_matrix.csv, <OUT>_correlation.csv, <OUT>_adjacency.csv,
/// <OUT>_tom_matrix.csv and <OUT>_dissimilarity.csv.
#[derive(Parser, Debug, Clone)]
#[command(name = "coexnet", version)]
pub struct Cli {
    /// GCT read-count table (plain or gzip)
    #[arg(long, default_value = "gene_reads.gct.gz")]
    pub gct: PathBuf,

    /// GTF annotation used for gene lengths (plain or gzip)
    #[arg(long, default_value = "annotation.gtf.gz")]
    pub gtf: PathBuf,

    /// Output prefix
    #[arg(long, default_value = "output")]
    pub out: PathBuf,

    /// Drop genes not expressed in at least this fraction of samples
    #[arg(long = "min-exp", default_value_t = 0.9)]
    pub min_exp: f64,

    /// Fraction of lowest-variance genes to drop
    #[arg(long = "min-var", default_value_t = 0.25)]
    pub min_var: f64,

    /// Soft-thresholding power
    #[arg(long, default_value_t = 6.0)]
    pub beta: f64,

    /// log2(TPM+1) below which a sample counts as not expressed
    #[arg(long = "exp-floor", default_value_t = 1.0)]
    pub exp_floor: f64,

    /// zero-correlation or exclude
    #[arg(long = "zero-variance", default_value = "zero-correlation")]
    pub zero_variance: ZeroVariancePolicy,

    /// exon-union, longest-transcript or gene-span
    #[arg(long = "length-policy", default_value = "exon-union")]
    pub length_policy: LengthPolicy,

    /// Write a JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// The run configuration these flags describe.
    pub fn config(&self) -> NetworkConfig {
        NetworkConfig {
            low_expression_threshold: self.min_exp,
            low_variance_percentile: self.min_var,
            soft_power_beta: self.beta,
            expression_floor: self.exp_floor,
            zero_variance: self.zero_variance,
            length_policy: self.length_policy,
            ..NetworkConfig::default()
        }
    }
}

/// Load inputs, build the network and write every output.
pub fn run(cli: &Cli) -> Result<PipelineReport> {
    let config = cli.config();
    config.validate()?;

    let lengths = read_length_table(&cli.gtf, config.length_policy).at_stage(Stage::LengthTable)?;
    let counts = read_gct(&cli.gct).at_stage(Stage::Load)?;

    let mut sink = CsvSink::new(&cli.out);
    let report = Pipeline::new(&config).run(&counts, &lengths, &mut sink)?;
    info!(files = sink.written().len(), "outputs written");

    if let Some(path) = &cli.report {
        let json = report.to_json().at_stage(Stage::Write)?;
        std::fs::write(path, json)
            .map_err(|e| {
                CoexnetError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", path.display(), e),
                ))
            })
            .at_stage(Stage::Write)?;
        info!(path = %path.display(), "report written");
    }

    info!("{}", report.summary());
    Ok(report)
}
