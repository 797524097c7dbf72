//! Structured error types for the coexnet workspace.

use thiserror::Error;

/// Pipeline stage a fatal error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    LengthTable,
    Load,
    Preprocess,
    Correlation,
    Adjacency,
    Tom,
    Dissimilarity,
    Write,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Stage::LengthTable => "length-table",
            Stage::Load => "load",
            Stage::Preprocess => "preprocess",
            Stage::Correlation => "correlation",
            Stage::Adjacency => "adjacency",
            Stage::Tom => "tom",
            Stage::Dissimilarity => "dissimilarity",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Unified error type for all coexnet operations.
#[derive(Debug, Error)]
pub enum CoexnetError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Compression or decompression failure
    #[error("compression error: {0}")]
    Compression(String),

    /// Malformed or unreadable gene length source.
    #[error("annotation error: {0}")]
    Annotation(String),

    /// A gene has no derivable length. Recoverable: the gene is dropped.
    #[error("missing annotation for gene '{gene}'")]
    MissingAnnotation { gene: String },

    /// A sample cannot be normalized (e.g. zero library size).
    #[error("invalid sample '{sample}': {reason}")]
    InvalidSample { sample: String, reason: String },

    /// A filter step would leave no genes for downstream stages.
    #[error("{step} filter removed all {input} genes")]
    DegenerateFilter { step: &'static str, input: usize },

    /// A non-finite value reached a numeric stage.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A fatal failure tagged with the pipeline stage that raised it.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<CoexnetError>,
    },

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl CoexnetError {
    /// Tag this error with the stage it aborted.
    ///
    /// Already-tagged errors keep their original stage.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            CoexnetError::Stage { .. } => self,
            other => CoexnetError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CoexnetError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the coexnet workspace.
pub type Result<T> = std::result::Result<T, CoexnetError>;

/// Extension for tagging a `Result` with a pipeline stage.
pub trait StageContext<T> {
    /// Wrap the error (if any) in [`CoexnetError::Stage`].
    fn at_stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn at_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}
