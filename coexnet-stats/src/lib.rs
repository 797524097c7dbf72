//! Statistical methods for the coexnet workspace.
//!
//! - **Descriptive statistics** — [`mean`], [`variance`], [`quantile`]
//! - **Normalization** — [`library_sizes`], [`tpm`]
//! - **Correlation** — pairwise Pearson [`CorrelationMatrix`]

pub mod correlation;
pub mod descriptive;
pub mod normalization;

pub use correlation::CorrelationMatrix;
pub use descriptive::{is_constant, mean, quantile, variance};
pub use normalization::{library_sizes, tpm};
