//! TOM dissimilarity, the distance handed to hierarchical clustering.

use coexnet_core::{CoexnetError, Result};
use coexnet_omics::GeneMatrix;
use tracing::info;

/// `1 - TOM[i][j]` for every pair, with a zero diagonal.
///
/// For TOM values in [0, 1] the subtraction is exact enough that
/// `dissimilarity + TOM == 1` holds bit for bit.
pub fn dissimilarity(tom: &GeneMatrix) -> Result<GeneMatrix> {
    if let Some((lo, hi)) = tom.min_max() {
        if lo < 0.0 || hi > 1.0 {
            return Err(CoexnetError::InvalidInput(format!(
                "TOM values must lie in [0, 1], found [{lo}, {hi}]"
            )));
        }
    }
    let distance = tom.map_off_diagonal(0.0, |t| 1.0 - t);
    info!(genes = distance.n(), "dissimilarity");
    Ok(distance)
}
