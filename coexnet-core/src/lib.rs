//! Shared primitives, traits, and utilities for the coexnet workspace.
//!
//! `coexnet-core` provides the foundation that all other coexnet crates build on:
//!
//! - **Error types** — [`CoexnetError`], [`Stage`], and [`Result`] for structured error handling
//! - **Traits** — [`Summarizable`], [`LabeledMatrix`], [`MatrixSink`]
//! - **Compression** — gzip-transparent text input (std feature only)

pub mod error;
pub mod traits;

#[cfg(feature = "std")]
pub mod compress;

pub use error::{CoexnetError, Result, Stage, StageContext};
pub use traits::*;
