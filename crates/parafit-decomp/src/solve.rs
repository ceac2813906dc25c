//! Right-hand solves `X · G = M` for the ALS mode update
//!
//! `G` is the R×R Hadamard product of Gram matrices and `M` the I_n×R
//! MTTKRP. Each row of `X` is an independent R-dimensional problem, solved
//! with `lstsq` against `Gᵀ`. The SVD of `G` only supplies the condition
//! estimate that decides whether the ridge is needed.
//!
//! Non-negative modes solve the same normal equations under `x ≥ 0` with
//! an active-set method working directly on `G` (Bro & De Jong).

use crate::config::FitConfig;
use crate::error::{FitError, FitResult};
use crate::kruskal::cast;
use crate::scalar::FitScalar;
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayView1, ArrayView2};
use scirs2_linalg::{lstsq, svd};

/// Outcome of one mode solve
#[derive(Debug, Clone)]
pub(crate) struct ModeSolution<T> {
    pub factor: Array2<T>,
    /// Condition estimate of `G` when the ridge had to engage
    pub ridge: Option<f64>,
}

/// Largest and smallest singular value of `g`
fn singular_value_range<T: FitScalar>(g: &Array2<T>) -> Option<(T, T)> {
    let (_, s, _) = svd(&g.view(), false, None).ok()?;
    let s_max = s.iter().fold(T::zero(), |acc, &x| acc.max(x));
    let s_min = s.iter().fold(T::infinity(), |acc, &x| acc.min(x));
    Some((s_max, s_min))
}

/// Solve `X · G = M` with `lstsq`, one row of `X` at a time
///
/// `None` if a row cannot be solved or the result is not finite.
pub(crate) fn right_solve<T: FitScalar>(m: &Array2<T>, g: &Array2<T>) -> Option<Array2<T>> {
    let g_t = g.t().to_owned();
    let mut result = Array2::<T>::zeros(m.dim());
    for (row, mut out) in m.outer_iter().zip(result.outer_iter_mut()) {
        let b = row.to_owned();
        let solution = lstsq(&g_t.view(), &b.view(), None).ok()?;
        for (dst, &x) in out.iter_mut().zip(solution.x.iter()) {
            *dst = x;
        }
    }
    result.iter().all(|x| x.is_finite()).then_some(result)
}

/// Solve `X · G = M` subject to `X ≥ 0`, row by row
pub(crate) fn nonnegative_right_solve<T: FitScalar>(
    m: &Array2<T>,
    g: &Array2<T>,
) -> Option<Array2<T>> {
    let mut result = Array2::<T>::zeros(m.dim());
    for (row, mut out) in m.outer_iter().zip(result.outer_iter_mut()) {
        let x = nnls_gram(&g.view(), &row)?;
        out.assign(&x);
    }
    result.iter().all(|x| x.is_finite()).then_some(result)
}

/// Minimise `½ xᵀ G x − bᵀ x` over `x ≥ 0` for symmetric positive
/// semi-definite `G`
///
/// This is Lawson-Hanson NNLS with the normal equations precomputed, so
/// every inner step is an R×R (or smaller) solve. `None` if a passive-set
/// subproblem cannot be solved.
pub(crate) fn nnls_gram<T: FitScalar>(g: &ArrayView2<T>, b: &ArrayView1<T>) -> Option<Array1<T>> {
    let n = b.len();
    let scale = g.iter().fold(T::zero(), |acc, &x| acc.max(x.abs()));
    let tol = cast::<T>(10.0 * n.max(1) as f64) * T::epsilon() * scale.max(T::one());

    let mut x = Array1::<T>::zeros(n);
    let mut passive = vec![false; n];
    let mut gradient = b.to_owned();

    for _ in 0..3 * n.max(1) {
        let candidate = (0..n)
            .filter(|&j| !passive[j])
            .max_by(|&i, &j| {
                gradient[i]
                    .partial_cmp(&gradient[j])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(j) = candidate else { break };
        if gradient[j] <= tol {
            break;
        }
        passive[j] = true;

        loop {
            let z = solve_passive(g, b, &passive)?;
            let blocked: Vec<usize> = (0..n)
                .filter(|&k| passive[k] && z[k] <= T::zero())
                .collect();
            if blocked.is_empty() {
                x = z;
                break;
            }
            // Step from x towards z until the first passive entry hits zero
            let mut step: Option<(usize, T)> = None;
            for &k in &blocked {
                let gap = x[k] - z[k];
                let alpha = if gap > T::zero() { x[k] / gap } else { T::zero() };
                if step.map_or(true, |(_, best)| alpha < best) {
                    step = Some((k, alpha));
                }
            }
            let (hit, alpha) = step?;
            for k in 0..n {
                let xk = x[k];
                x[k] += alpha * (z[k] - xk);
            }
            x[hit] = T::zero();
            passive[hit] = false;
            for k in 0..n {
                if passive[k] && x[k] <= tol {
                    passive[k] = false;
                    x[k] = T::zero();
                }
            }
            if !passive.iter().any(|&p| p) {
                break;
            }
        }

        gradient = b.to_owned() - g.dot(&x);
    }
    Some(x)
}

/// Unconstrained solution on the passive set, zero elsewhere
fn solve_passive<T: FitScalar>(
    g: &ArrayView2<T>,
    b: &ArrayView1<T>,
    passive: &[bool],
) -> Option<Array1<T>> {
    let index: Vec<usize> = (0..passive.len()).filter(|&k| passive[k]).collect();
    let sub = Array2::from_shape_fn((index.len(), index.len()), |(i, j)| g[[index[i], index[j]]]);
    let rhs: Array1<T> = index.iter().map(|&k| b[k]).collect();
    let solution = lstsq(&sub.view(), &rhs.view(), None).ok()?;

    let mut z = Array1::<T>::zeros(passive.len());
    for (&k, &value) in index.iter().zip(solution.x.iter()) {
        z[k] = value;
    }
    z.iter().all(|v| v.is_finite()).then_some(z)
}

/// Solve one mode update, engaging the ridge `λ = ridge · max(1, σ_max)`
/// when `G` is ill-conditioned or the plain solve fails
pub(crate) fn solve_mode<T: FitScalar>(
    m: &Array2<T>,
    g: &Array2<T>,
    config: &FitConfig,
    non_negative: bool,
) -> FitResult<ModeSolution<T>> {
    if !g.iter().all(|x| x.is_finite()) {
        return Err(FitError::NumericalInstability(
            "Gram matrix has NaN or infinite entries".into(),
        ));
    }
    let solve = |gram: &Array2<T>| {
        if non_negative {
            nonnegative_right_solve(m, gram)
        } else {
            right_solve(m, gram)
        }
    };

    let range = singular_value_range(g);
    let condition = match range {
        Some((s_max, s_min)) => (s_max / s_min).to_f64_lossy(),
        None => f64::INFINITY,
    };
    if condition.is_finite() && condition <= config.max_condition {
        if let Some(factor) = solve(g) {
            return Ok(ModeSolution {
                factor,
                ridge: None,
            });
        }
    }

    let s_max = range
        .map(|(s, _)| s.to_f64_lossy())
        .filter(|s| s.is_finite())
        .unwrap_or(1.0);
    let lambda = config.ridge * s_max.max(1.0);
    let mut ridged = g.clone();
    for i in 0..ridged.nrows() {
        ridged[[i, i]] += cast::<T>(lambda);
    }
    let factor = solve(&ridged).ok_or_else(|| {
        FitError::NumericalInstability(format!(
            "Gram system not solvable after ridge {:.3e} (condition {:.3e})",
            lambda, condition
        ))
    })?;
    Ok(ModeSolution {
        factor,
        ridge: Some(condition),
    })
}
