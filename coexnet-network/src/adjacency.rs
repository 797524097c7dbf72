//! Soft-threshold adjacency: `a[i][j] = |r[i][j]|^β`.

use coexnet_core::{CoexnetError, Result};
use coexnet_omics::GeneMatrix;
use tracing::info;

/// Raise the absolute correlation of every pair to the power `beta`.
///
/// Sign is discarded. The diagonal is 1. For `beta >= 0` and correlations
/// in [-1, 1] every value lies in [0, 1].
pub fn soft_threshold(correlation: &GeneMatrix, beta: f64) -> Result<GeneMatrix> {
    if !beta.is_finite() || beta < 0.0 {
        return Err(CoexnetError::InvalidInput(format!(
            "soft-threshold power must be finite and >= 0, got {beta}"
        )));
    }
    if let Some((lo, hi)) = correlation.min_max() {
        if lo < -1.0 || hi > 1.0 {
            return Err(CoexnetError::InvalidInput(format!(
                "correlation values must lie in [-1, 1], found [{lo}, {hi}]"
            )));
        }
    }
    let adjacency = correlation.map_off_diagonal(1.0, |r| r.abs().powf(beta));
    info!(beta, genes = adjacency.n(), "adjacency");
    Ok(adjacency)
}
