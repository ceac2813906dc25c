//! Core consistency diagnostic (CORCONDIA)
//!
//! Given the factors of a CP model, the least-squares Tucker core
//!
//! ```text
//! G = X ×₁ A₁⁺ ×₂ A₂⁺ ⋯ ×_N A_N⁺
//! ```
//!
//! is compared with the superdiagonal core T the CP model implies:
//!
//! ```text
//! CC = 100 · (1 − ‖G − T‖² / ‖G‖²)
//! ```
//!
//! Values near 100 indicate an appropriate rank; values far below, or
//! negative, indicate overfactoring.

use crate::error::{ScoreError, ScoreResult};
use parafit_core::DenseND;
use parafit_decomp::{FitScalar, KruskalTensor};
use parafit_kernels::nmode_product;
use scirs2_core::ndarray_ext::{Array1, Array2, Axis};
use scirs2_linalg::lstsq;

/// Core consistency of `model` as a description of `tensor`, in percent
///
/// The weights are absorbed into the first factor, so a model that
/// reproduces the tensor exactly scores 100.
///
/// # Errors
///
/// [`ScoreError::ShapeMismatch`] when the shapes differ and
/// [`ScoreError::InvalidInput`] when the estimated core is zero or not
/// finite.
///
/// # Examples
///
/// ```
/// use parafit_decomp::KruskalTensor;
/// use parafit_metrics::core_consistency;
///
/// let model = KruskalTensor::<f64>::random_init(&[6, 7, 8], 2, 3).unwrap();
/// let tensor = model.construct_tensor().unwrap();
/// let cc = core_consistency(&tensor, &model).unwrap();
/// assert!((cc - 100.0).abs() < 1e-6);
/// ```
pub fn core_consistency<T: FitScalar>(
    tensor: &DenseND<T>,
    model: &KruskalTensor<T>,
) -> ScoreResult<f64> {
    if tensor.shape() != model.shape().as_slice() {
        return Err(ScoreError::ShapeMismatch(format!(
            "tensor shape {:?} differs from model shape {:?}",
            tensor.shape(),
            model.shape()
        )));
    }

    let mut core = tensor.clone();
    for (mode, factor) in model.factors().iter().enumerate() {
        let mut factor = factor.clone();
        if mode == 0 {
            for (mut column, &w) in factor.axis_iter_mut(Axis(1)).zip(model.weights().iter()) {
                column.mapv_inplace(|x| x * w);
            }
        }
        let pinv = pseudo_inverse(&factor)?;
        core = nmode_product(&core, &pinv.view(), mode)?;
    }

    let n_modes = core.rank();
    let mut core_squared = 0.0;
    let mut misfit = 0.0;
    for (index, &value) in core.as_array().indexed_iter() {
        let g = value.to_f64_lossy();
        let target = if (1..n_modes).all(|k| index[k] == index[0]) {
            1.0
        } else {
            0.0
        };
        core_squared += g * g;
        misfit += (g - target) * (g - target);
    }

    if !core_squared.is_finite() || core_squared == 0.0 {
        return Err(ScoreError::InvalidInput(format!(
            "estimated core has squared norm {}",
            core_squared
        )));
    }

    let consistency = 100.0 * (1.0 - misfit / core_squared);
    tracing::debug!(rank = model.rank(), consistency, "core consistency");
    Ok(consistency)
}

/// Pseudo-inverse of a factor matrix, one least-squares solve per column
///
/// Column `i` of `A⁺` is the least-squares solution of `A x = eᵢ`.
fn pseudo_inverse<T: FitScalar>(matrix: &Array2<T>) -> ScoreResult<Array2<T>> {
    let (rows, cols) = matrix.dim();
    let mut pinv = Array2::<T>::zeros((cols, rows));
    for (i, mut column) in pinv.axis_iter_mut(Axis(1)).enumerate() {
        let mut unit = Array1::<T>::zeros(rows);
        unit[i] = T::one();
        let solution = lstsq(&matrix.view(), &unit.view(), None)?;
        for (dst, &x) in column.iter_mut().zip(solution.x.iter()) {
            *dst = x;
        }
    }
    Ok(pinv)
}
