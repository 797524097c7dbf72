//! File formats for the coexnet pipeline.
//!
//! Supported formats:
//! - **GCT** — GTEx read-count tables, via the `gct` feature
//! - **GTF** — Gene Transfer Format annotation, via the `gtf` feature
//! - **CSV** — labeled matrix output, via the `csv` feature
//!
//! Inputs may be plain or gzip-compressed.

#[cfg(feature = "gct")]
pub mod gct;

#[cfg(feature = "gtf")]
pub mod gtf;

#[cfg(feature = "csv")]
pub mod csv;

// Re-exports for convenience.

#[cfg(feature = "gct")]
pub use gct::{read_gct, read_gct_reader, GctDims};

#[cfg(feature = "gtf")]
pub use gtf::{parse_gtf, parse_gtf_reader, read_length_table};

#[cfg(feature = "csv")]
pub use csv::{write_matrix_csv, CsvSink};
