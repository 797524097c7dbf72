//! GCT count-table reader.
//!
//! GCT is the tab-separated expression format used by GTEx:
//!
//! ```text
//! #1.2
//! <n_genes>\t<n_samples>
//! Name\tDescription\t<sample…>
//! <gene_id>\t<description>\t<value…>
//! ```
//!
//! The version and dimension lines are optional. When the dimension line is
//! present it must agree with the table that follows. Values are read counts
//! and must be finite and non-negative.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord, Trim};
use coexnet_core::compress::{compression_error, open_text};
use coexnet_core::{CoexnetError, Result, Summarizable};
use coexnet_omics::ExpressionMatrix;
use tracing::{debug, info};

/// Declared table size from the optional dimension line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GctDims {
    pub n_genes: usize,
    pub n_samples: usize,
}

/// Read a (possibly gzip-compressed) GCT file into a gene × sample matrix.
pub fn read_gct(path: impl AsRef<Path>) -> Result<ExpressionMatrix> {
    let path = path.as_ref();
    let reader = open_text(path)?;
    let matrix = read_gct_reader(reader, path)?;
    info!(path = %path.display(), "{}", matrix.summary());
    Ok(matrix)
}

/// Read GCT text from any reader. `source` names it in errors.
pub fn read_gct_reader<R: Read>(reader: R, source: &Path) -> Result<ExpressionMatrix> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut dims: Option<GctDims> = None;
    let mut samples: Option<Vec<String>> = None;
    let mut genes: Vec<String> = Vec::new();
    let mut seen_genes: HashSet<String> = HashSet::new();
    let mut data: Vec<f64> = Vec::new();

    let mut record = StringRecord::new();
    let mut records_read = 0usize;
    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => records_read += 1,
            Ok(false) => break,
            Err(e) => return Err(read_error(source, records_read + 1, e)),
        }
        let line = record.position().map_or(records_read as u64, |p| p.line());

        if record.iter().all(str::is_empty) {
            continue;
        }

        let Some(sample_names) = samples.as_ref() else {
            if dims.is_none() && genes.is_empty() {
                if let Some(d) = parse_dims(&record) {
                    debug!(n_genes = d.n_genes, n_samples = d.n_samples, "GCT dimension line");
                    dims = Some(d);
                    continue;
                }
            }
            samples = Some(parse_header(&record, source, line)?);
            continue;
        };

        if record.len() != sample_names.len() + 2 {
            return Err(CoexnetError::Parse(format!(
                "{}: line {line}: expected {} columns, found {}",
                source.display(),
                sample_names.len() + 2,
                record.len()
            )));
        }

        let gene_id = &record[0];
        if gene_id.is_empty() {
            return Err(CoexnetError::Parse(format!(
                "{}: line {line}: empty gene id",
                source.display()
            )));
        }
        if !seen_genes.insert(gene_id.to_string()) {
            return Err(CoexnetError::Parse(format!(
                "{}: line {line}: duplicate gene id '{gene_id}'",
                source.display()
            )));
        }

        for (j, field) in record.iter().skip(2).enumerate() {
            let value = parse_count(field).ok_or_else(|| {
                CoexnetError::Parse(format!(
                    "{}: line {line}: sample '{}' has invalid count '{field}'",
                    source.display(),
                    sample_names[j]
                ))
            })?;
            data.push(value);
        }
        genes.push(gene_id.to_string());
    }

    let Some(samples) = samples else {
        return Err(CoexnetError::Parse(format!(
            "{}: missing 'Name\\tDescription\\t<samples>' header",
            source.display()
        )));
    };
    if genes.is_empty() {
        return Err(CoexnetError::Parse(format!(
            "{}: no gene rows",
            source.display()
        )));
    }

    if let Some(d) = dims {
        if d.n_genes != genes.len() || d.n_samples != samples.len() {
            return Err(CoexnetError::Parse(format!(
                "{}: dimension line declares {}x{}, table is {}x{}",
                source.display(),
                d.n_genes,
                d.n_samples,
                genes.len(),
                samples.len()
            )));
        }
    }

    ExpressionMatrix::from_flat(data, genes, samples)
}

fn parse_dims(record: &StringRecord) -> Option<GctDims> {
    if record.len() != 2 {
        return None;
    }
    let n_genes = record[0].parse().ok()?;
    let n_samples = record[1].parse().ok()?;
    Some(GctDims { n_genes, n_samples })
}

fn parse_header(record: &StringRecord, source: &Path, line: u64) -> Result<Vec<String>> {
    let bad_header = |msg: &str| {
        CoexnetError::Parse(format!("{}: line {line}: {msg}", source.display()))
    };
    if record.len() < 3 {
        return Err(bad_header("header needs Name, Description and at least one sample"));
    }
    if !record[0].eq_ignore_ascii_case("name") || !record[1].eq_ignore_ascii_case("description") {
        return Err(bad_header("header must start with 'Name\\tDescription'"));
    }

    let samples: Vec<String> = record.iter().skip(2).map(str::to_string).collect();
    let mut seen = HashSet::with_capacity(samples.len());
    for s in &samples {
        if s.is_empty() {
            return Err(bad_header("empty sample name"));
        }
        if !seen.insert(s.as_str()) {
            return Err(bad_header(&format!("duplicate sample name '{s}'")));
        }
    }
    Ok(samples)
}

fn parse_count(field: &str) -> Option<f64> {
    let v: f64 = field.parse().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

fn read_error(source: &Path, line: usize, e: ::csv::Error) -> CoexnetError {
    let msg = e.to_string();
    match e.into_kind() {
        ::csv::ErrorKind::Io(io) => compression_error(source, line, io),
        _ => CoexnetError::Parse(format!("{}: {msg}", source.display())),
    }
}
