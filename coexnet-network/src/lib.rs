//! Weighted gene co-expression network construction.
//!
//! Raw RNA-seq counts become a gene × gene distance matrix in five stages:
//!
//! - **Preprocessing** — [`Preprocessor`]: TPM → log2(TPM+1), low-expression
//!   and low-variance filters
//! - **Correlation** — [`correlate`]: Pearson, zero for constant genes
//! - **Adjacency** — [`soft_threshold`]: `|r|^β`
//! - **Topological overlap** — [`topological_overlap`]
//! - **Dissimilarity** — [`dissimilarity`]: `1 - TOM`
//!
//! [`Pipeline`] runs them in order under one [`NetworkConfig`].
//!
//! # Quick start
//!
//! ```
//! use coexnet_network::{correlate, dissimilarity, soft_threshold, topological_overlap};
//! use coexnet_omics::ExpressionMatrix;
//!
//! let expr = ExpressionMatrix::new(
//!     vec![vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 4.1, 6.0, 8.2], vec![4.0, 1.0, 3.0, 2.0]],
//!     vec!["a".into(), "b".into(), "c".into()],
//!     vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()],
//! ).unwrap();
//!
//! let corr = correlate(&expr).unwrap();
//! let adj = soft_threshold(&corr.matrix, 6.0).unwrap();
//! let tom = topological_overlap(&adj, 1e-12).unwrap();
//! let dist = dissimilarity(&tom.matrix).unwrap();
//!
//! assert_eq!(dist.get(0, 0), 0.0);
//! assert!(dist.get(0, 1) < dist.get(0, 2));
//! ```

pub mod adjacency;
pub mod config;
pub mod correlation;
pub mod dissimilarity;
pub mod pipeline;
pub mod preprocess;
pub mod tom;

pub use adjacency::soft_threshold;
pub use config::{NetworkConfig, ZeroVariancePolicy};
pub use correlation::{correlate, Correlation};
pub use dissimilarity::dissimilarity;
pub use pipeline::{Pipeline, PipelineReport, WriteFailure};
pub use preprocess::{FilterThresholds, PreprocessReport, Preprocessed, Preprocessor};
pub use tom::{topological_overlap, TopologicalOverlap};
