//! Topological Overlap Measure.
//!
//! For genes `i != j`:
//!
//! ```text
//! TOM[i][j] = (L[i][j] + A[i][j]) / (min(k[i], k[j]) + 1 - A[i][j])
//! L[i][j]   = Σ_{u ≠ i,j} A[i][u] · A[u][j]
//! k[i]      = Σ_{u ≠ i} A[i][u]
//! ```
//!
//! With `A0` the adjacency matrix with its diagonal zeroed, `k` is the row
//! sum of `A0` and `L[i][j]` is the dot product of rows `i` and `j` of `A0`
//! (the off-diagonal of `A0 · A0`, since `A0` is symmetric). Each worker
//! owns one row of the upper triangle and computes its products there, so
//! the cubic neighbour sum is spread over the rayon pool.

use coexnet_core::{CoexnetError, Result};
use coexnet_omics::GeneMatrix;
use ndarray::{Array2, Axis};
use tracing::{info, warn};

/// TOM matrix plus the number of denominators that had to be clamped.
#[derive(Debug, Clone)]
pub struct TopologicalOverlap {
    pub matrix: GeneMatrix,
    pub clamped_denominators: usize,
}

/// Topological overlap of a soft-threshold adjacency matrix.
///
/// Adjacency values must lie in [0, 1]. A denominator that is not finite or
/// not above `epsilon` is replaced by `epsilon` and counted; results are
/// clamped into [0, 1]. The diagonal is 1.
pub fn topological_overlap(adjacency: &GeneMatrix, epsilon: f64) -> Result<TopologicalOverlap> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(CoexnetError::InvalidInput(format!(
            "TOM epsilon must be positive, got {epsilon}"
        )));
    }
    if let Some((lo, hi)) = adjacency.min_max() {
        if lo < 0.0 || hi > 1.0 {
            return Err(CoexnetError::InvalidInput(format!(
                "adjacency values must lie in [0, 1], found [{lo}, {hi}]"
            )));
        }
    }

    let n = adjacency.n();
    let mut a0 = Array2::from_shape_vec((n, n), adjacency.as_slice().to_vec())
        .map_err(|e| CoexnetError::InvalidInput(format!("adjacency shape: {e}")))?;
    a0.diag_mut().fill(0.0);
    let k = a0.sum_axis(Axis(1));

    let upper_row = |i: usize| -> (Vec<f64>, usize) {
        let mut clamped = 0;
        let a_i = a0.row(i);
        let row = ((i + 1)..n)
            .map(|j| {
                let shared = a_i.dot(&a0.row(j));
                let (t, was_clamped) = overlap(shared, a0[[i, j]], k[i], k[j], epsilon);
                clamped += usize::from(was_clamped);
                t
            })
            .collect();
        (row, clamped)
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<(Vec<f64>, usize)> = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(upper_row).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<(Vec<f64>, usize)> = (0..n).map(upper_row).collect();

    let mut clamped_denominators = 0;
    let mut upper = Vec::with_capacity(n);
    for (row, clamped) in rows {
        clamped_denominators += clamped;
        if let Some(v) = row.iter().find(|v| !v.is_finite()) {
            return Err(CoexnetError::NumericDegeneracy(format!(
                "TOM produced {v}"
            )));
        }
        upper.push(row);
    }
    if clamped_denominators > 0 {
        warn!(pairs = clamped_denominators, epsilon, "TOM denominators clamped");
    }

    let matrix = GeneMatrix::from_upper(adjacency.labels_arc(), 1.0, upper)?;
    info!(genes = n, "topological overlap");
    Ok(TopologicalOverlap {
        matrix,
        clamped_denominators,
    })
}

/// One off-diagonal TOM value; the flag reports a clamped denominator.
fn overlap(shared: f64, a: f64, k_i: f64, k_j: f64, epsilon: f64) -> (f64, bool) {
    let denominator = k_i.min(k_j) + 1.0 - a;
    let (denominator, clamped) = if denominator.is_finite() && denominator > epsilon {
        (denominator, false)
    } else {
        (epsilon, true)
    };
    (((shared + a) / denominator).clamp(0.0, 1.0), clamped)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_adjacency() -> impl Strategy<Value = GeneMatrix> {
        (1..10usize).prop_flat_map(|n| {
            proptest::collection::vec(0.0..=1.0f64, n * (n - 1) / 2).prop_map(move |upper| {
                let mut rows = Vec::with_capacity(n);
                let mut it = upper.into_iter();
                for i in 0..n {
                    rows.push(it.by_ref().take(n - i - 1).collect());
                }
                let labels: Vec<String> = (0..n).map(|i| format!("g{i}")).collect();
                GeneMatrix::from_upper(labels.into(), 1.0, rows).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn symmetric_unit_interval_unit_diagonal(a in arb_adjacency()) {
            let tom = topological_overlap(&a, 1e-12).unwrap();
            prop_assert_eq!(tom.clamped_denominators, 0);
            prop_assert_eq!(tom.matrix.labels(), a.labels());
            for i in 0..tom.matrix.n() {
                prop_assert_eq!(tom.matrix.get(i, i), 1.0);
                for j in 0..tom.matrix.n() {
                    let t = tom.matrix.get(i, j);
                    prop_assert_eq!(t, tom.matrix.get(j, i));
                    prop_assert!((0.0..=1.0).contains(&t));
                }
            }
        }
    }
}
