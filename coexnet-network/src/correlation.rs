//! Gene × gene Pearson correlation of a filtered expression matrix.

use coexnet_core::{Result, Summarizable};
use coexnet_omics::{ExpressionMatrix, GeneMatrix};
use coexnet_stats::CorrelationMatrix;
use tracing::{info, warn};

/// Correlation matrix plus the genes whose correlation was undefined.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub matrix: GeneMatrix,
    /// Constant genes, assigned correlation 0 with every other gene.
    pub zero_variance: Vec<String>,
}

/// Pearson correlation between every pair of genes (rows) of `expr`.
///
/// The diagonal is 1. A gene with no variance across samples correlates 0
/// with everything else; such genes are listed in the result.
pub fn correlate(expr: &ExpressionMatrix) -> Result<Correlation> {
    let rows: Vec<&[f64]> = expr.rows().collect();
    let cm = CorrelationMatrix::from_rows(&rows)?;
    let zero_variance: Vec<String> = cm
        .zero_variance()
        .iter()
        .map(|&i| expr.feature_names()[i].clone())
        .collect();
    if !zero_variance.is_empty() {
        warn!(
            genes = zero_variance.len(),
            "zero-variance genes given correlation 0"
        );
    }

    let matrix = GeneMatrix::from_vec(expr.feature_names().to_vec().into(), cm.into_data())?;
    info!("correlation: {}", matrix.summary());
    Ok(Correlation {
        matrix,
        zero_variance,
    })
}
