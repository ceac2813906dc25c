//! Linear assignment by the Hungarian algorithm
//!
//! Shortest augmenting path formulation with row and column potentials,
//! O(n²m) for an n × m matrix with n ≤ m. Each row is matched to a distinct
//! column.

use crate::error::{ScoreError, ScoreResult};
use scirs2_core::ndarray_ext::ArrayView2;

/// Optimal matching of rows to columns
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// `columns[i]` is the column matched to row `i`
    pub columns: Vec<usize>,
    /// Sum of the matched entries
    pub total: f64,
}

/// Matching that minimises the summed cost
///
/// # Errors
///
/// [`ScoreError::ShapeMismatch`] when there are more rows than columns and
/// [`ScoreError::InvalidInput`] for NaN or infinite costs.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use parafit_metrics::min_cost_assignment;
///
/// let cost = array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
/// let assignment = min_cost_assignment(&cost.view()).unwrap();
/// assert_eq!(assignment.columns, vec![1, 0, 2]);
/// assert_eq!(assignment.total, 5.0);
/// ```
pub fn min_cost_assignment(cost: &ArrayView2<f64>) -> ScoreResult<Assignment> {
    let (n, m) = cost.dim();
    if n > m {
        return Err(ScoreError::ShapeMismatch(format!(
            "assignment needs at least as many columns as rows, got {} × {}",
            n, m
        )));
    }
    if cost.iter().any(|c| !c.is_finite()) {
        return Err(ScoreError::InvalidInput(
            "assignment costs must be finite".into(),
        ));
    }
    if n == 0 {
        return Ok(Assignment {
            columns: Vec::new(),
            total: 0.0,
        });
    }

    // 1-based: index 0 is the virtual column that starts each augmentation
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut row_of = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        row_of[0] = row;
        let mut j0 = 0;
        let mut min_reduced = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = row_of[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if reduced < min_reduced[j] {
                    min_reduced[j] = reduced;
                    way[j] = j0;
                }
                if min_reduced[j] < delta {
                    delta = min_reduced[j];
                    j1 = j;
                }
            }
            if j1 == 0 {
                return Err(ScoreError::InvalidInput(
                    "no augmenting path; costs overflowed".into(),
                ));
            }
            for j in 0..=m {
                if used[j] {
                    u[row_of[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_reduced[j] -= delta;
                }
            }
            j0 = j1;
            if row_of[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            row_of[j0] = row_of[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut columns = vec![0usize; n];
    for j in 1..=m {
        if row_of[j] != 0 {
            columns[row_of[j] - 1] = j - 1;
        }
    }
    let total = columns
        .iter()
        .enumerate()
        .map(|(i, &j)| cost[[i, j]])
        .sum();
    Ok(Assignment { columns, total })
}

/// Matching that maximises the summed score
pub fn max_score_assignment(scores: &ArrayView2<f64>) -> ScoreResult<Assignment> {
    let negated = scores.mapv(|s| -s);
    let assignment = min_cost_assignment(&negated.view())?;
    Ok(Assignment {
        total: -assignment.total,
        columns: assignment.columns,
    })
}
