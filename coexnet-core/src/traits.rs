//! Core trait definitions for the coexnet workspace.
//!
//! These traits define the contracts that matrix types and output sinks
//! implement across crates.

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}

/// A dense matrix with one label per row and per column.
///
/// Labels are positional: row `i` is described by `row_labels()[i]`.
pub trait LabeledMatrix {
    /// Row labels, one per row.
    fn row_labels(&self) -> &[String];

    /// Column labels, one per column.
    fn col_labels(&self) -> &[String];

    /// Value at row `i`, column `j`. Callers stay within `shape()`.
    fn value(&self, i: usize, j: usize) -> f64;

    /// (rows, columns).
    fn shape(&self) -> (usize, usize) {
        (self.row_labels().len(), self.col_labels().len())
    }
}

/// A destination for named labeled matrices (files, memory, ...).
pub trait MatrixSink {
    /// Persist `matrix` under `name`. The write is complete when this returns `Ok`.
    fn write_matrix(&mut self, name: &str, matrix: &dyn LabeledMatrix) -> crate::Result<()>;
}
