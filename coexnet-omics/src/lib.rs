//! Omics data structures for the coexnet workspace.
//!
//! - **Expression matrices** — Dense [`ExpressionMatrix`] (features × samples)
//! - **Gene × gene matrices** — Symmetric [`GeneMatrix`] sharing one gene ordering
//! - **Gene annotations** — [`Gene`], [`Transcript`], [`Exon`] hierarchy
//! - **Gene lengths** — [`LengthTable`] built under a [`LengthPolicy`]
//!
//! # Quick start
//!
//! ```
//! use coexnet_omics::ExpressionMatrix;
//! use coexnet_core::Summarizable;
//!
//! let matrix = ExpressionMatrix::new(
//!     vec![vec![1.0, 2.0], vec![3.0, 4.0]],
//!     vec!["gene1".into(), "gene2".into()],
//!     vec!["sample_a".into(), "sample_b".into()],
//! ).unwrap();
//!
//! assert_eq!(matrix.shape(), (2, 2));
//! assert_eq!(matrix.get(0, 1), Some(2.0));
//! assert_eq!(matrix.summary(), "ExpressionMatrix: 2 features \u{00d7} 2 samples");
//! ```

pub mod annotation;
pub mod expr;
pub mod gene_matrix;
pub mod length;

pub use annotation::{Exon, Gene, Transcript};
pub use expr::ExpressionMatrix;
pub use gene_matrix::GeneMatrix;
pub use length::{strip_version, LengthPolicy, LengthTable};
