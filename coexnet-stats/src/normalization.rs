//! Count normalization for RNA-seq.
//!
//! All functions operate on row-major `&[f64]` slices with dimensions
//! `(n_genes, n_samples)`, matching `coexnet_omics::ExpressionMatrix` layout.
//!
//! - [`library_sizes`] — Per-sample total counts
//! - [`tpm`] — Transcripts per million (requires gene lengths in kb)

use coexnet_core::{CoexnetError, Result};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn validate_matrix(counts: &[f64], n_genes: usize, n_samples: usize) -> Result<()> {
    if n_genes == 0 || n_samples == 0 {
        return Err(CoexnetError::InvalidInput(
            "normalization: matrix must have at least 1 gene and 1 sample".into(),
        ));
    }
    if counts.len() != n_genes * n_samples {
        return Err(CoexnetError::InvalidInput(format!(
            "normalization: counts length ({}) != n_genes ({}) * n_samples ({})",
            counts.len(),
            n_genes,
            n_samples,
        )));
    }
    if let Some(pos) = counts.iter().position(|&c| !c.is_finite() || c < 0.0) {
        return Err(CoexnetError::InvalidInput(format!(
            "normalization: count at gene {}, sample {} is {} (must be finite and non-negative)",
            pos / n_samples,
            pos % n_samples,
            counts[pos],
        )));
    }
    Ok(())
}

fn column_sums(counts: &[f64], n_genes: usize, n_samples: usize) -> Vec<f64> {
    let mut sums = vec![0.0; n_samples];
    for i in 0..n_genes {
        let row = &counts[i * n_samples..(i + 1) * n_samples];
        for (j, &v) in row.iter().enumerate() {
            sums[j] += v;
        }
    }
    sums
}

// ── Library size ─────────────────────────────────────────────────────────────

/// Total counts per sample (column sums).
pub fn library_sizes(counts: &[f64], n_genes: usize, n_samples: usize) -> Result<Vec<f64>> {
    validate_matrix(counts, n_genes, n_samples)?;
    Ok(column_sums(counts, n_genes, n_samples))
}

// ── TPM ──────────────────────────────────────────────────────────────────────

/// Transcripts per million.
///
/// 1. Divide each count by gene length in kb (→ reads per kilobase, RPK).
/// 2. Sum RPK per sample, then scale each sample's RPK values to sum to 1M.
///
/// A sample whose RPK sum is zero has no defined TPM and is rejected with
/// [`CoexnetError::InvalidSample`] naming its column index.
pub fn tpm(
    counts: &[f64],
    n_genes: usize,
    n_samples: usize,
    lengths_kb: &[f64],
) -> Result<Vec<f64>> {
    validate_matrix(counts, n_genes, n_samples)?;
    if lengths_kb.len() != n_genes {
        return Err(CoexnetError::InvalidInput(format!(
            "tpm: lengths length ({}) != n_genes ({})",
            lengths_kb.len(),
            n_genes,
        )));
    }

    let mut rpk = vec![0.0; counts.len()];
    for (i, &len_kb) in lengths_kb.iter().enumerate() {
        if !len_kb.is_finite() || len_kb <= 0.0 {
            return Err(CoexnetError::InvalidInput(format!(
                "tpm: lengths[{i}] must be positive",
            )));
        }
        for j in 0..n_samples {
            rpk[i * n_samples + j] = counts[i * n_samples + j] / len_kb;
        }
    }

    let rpk_sums = column_sums(&rpk, n_genes, n_samples);
    if let Some(j) = rpk_sums.iter().position(|&s| s <= 0.0) {
        return Err(CoexnetError::InvalidSample {
            sample: format!("column {j}"),
            reason: "library size is zero, TPM undefined".into(),
        });
    }

    let mut out = vec![0.0; counts.len()];
    for i in 0..n_genes {
        for j in 0..n_samples {
            let idx = i * n_samples + j;
            out[idx] = rpk[idx] / rpk_sums[j] * 1e6;
        }
    }
    Ok(out)
}

// ── Tests ────────────────────────────────────────────────────────────────────
