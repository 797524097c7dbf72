//! CSV output for labeled matrices.
//!
//! Every matrix is written as `gene_id,<column labels…>` followed by one row
//! per row label, values in fixed-point with six decimals.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use ::csv::WriterBuilder;
use coexnet_core::{CoexnetError, LabeledMatrix, MatrixSink, Result};
use tracing::debug;

/// Decimal places written for every value.
pub const DECIMALS: usize = 6;

/// Write `matrix` to `path` as CSV.
///
/// The file is created (or truncated), fully written and flushed before this
/// returns; it is closed on every path.
pub fn write_matrix_csv(path: impl AsRef<Path>, matrix: &dyn LabeledMatrix) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| write_error(path, e))?;

    let (n_rows, n_cols) = matrix.shape();
    let mut record: Vec<String> = Vec::with_capacity(n_cols + 1);

    record.push("gene_id".to_string());
    record.extend(matrix.col_labels().iter().cloned());
    writer.write_record(&record).map_err(|e| write_error(path, e))?;

    for (i, label) in matrix.row_labels().iter().enumerate() {
        record.clear();
        record.push(label.clone());
        record.extend((0..n_cols).map(|j| format!("{:.*}", DECIMALS, matrix.value(i, j))));
        writer.write_record(&record).map_err(|e| write_error(path, e))?;
    }

    writer.flush().map_err(|e| {
        CoexnetError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    debug!(path = %path.display(), rows = n_rows, cols = n_cols, "wrote matrix");
    Ok(())
}

fn write_error(path: &Path, e: ::csv::Error) -> CoexnetError {
    let msg = e.to_string();
    match e.into_kind() {
        ::csv::ErrorKind::Io(io) => {
            CoexnetError::Io(std::io::Error::new(io.kind(), format!("{}: {msg}", path.display())))
        }
        _ => CoexnetError::Parse(format!("{}: {msg}", path.display())),
    }
}

/// A [`MatrixSink`] writing `<prefix>_<name>.csv` files.
///
/// The prefix may include directories (`out/run1` → `out/run1_tom_matrix.csv`);
/// they must already exist.
#[derive(Debug, Clone)]
pub struct CsvSink {
    prefix: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvSink {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    /// The file a matrix named `name` is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut file: OsString = self.prefix.clone().into_os_string();
        file.push(format!("_{name}.csv"));
        PathBuf::from(file)
    }

    /// Files successfully written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl MatrixSink for CsvSink {
    fn write_matrix(&mut self, name: &str, matrix: &dyn LabeledMatrix) -> Result<()> {
        let path = self.path_for(name);
        write_matrix_csv(&path, matrix)?;
        self.written.push(path);
        Ok(())
    }
}
