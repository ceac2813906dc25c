//! MTTKRP (Matricized Tensor Times Khatri-Rao Product)
//!
//! For tensor X and factor matrices {A₀, …, A_{N-1}}:
//!
//! M = X_(n) · (A₀ ⊙ … ⊙ A_{n-1} ⊙ A_{n+1} ⊙ … ⊙ A_{N-1})
//!
//! This is the right-hand side of every ALS mode update.

use crate::error::{check_common_rank, KernelError, KernelResult};
use crate::khatri_rao::khatri_rao_skip;
use parafit_core::DenseND;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Float;

/// Compute the mode-`mode` MTTKRP
///
/// Returns a matrix of shape `(I_mode, R)`.
///
/// # Errors
///
/// Returns an error if:
/// - `mode` is out of bounds
/// - the number of factors differs from the tensor order
/// - a factor's row count differs from the matching tensor dimension
/// - the factors disagree on the number of columns
///
/// # Complexity
///
/// Time: O(R · Π Iₖ)
/// Space: O(R · Π_{k≠mode} Iₖ) for the Khatri-Rao product
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use parafit_core::DenseND;
/// use parafit_kernels::mttkrp;
///
/// let tensor = DenseND::from_vec((0..24).map(|x| x as f64).collect(), &[2, 3, 4]).unwrap();
/// let factors = [
///     Array2::<f64>::ones((2, 2)),
///     Array2::<f64>::ones((3, 2)),
///     Array2::<f64>::ones((4, 2)),
/// ];
/// let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
///
/// let m = mttkrp(&tensor, &views, 1).unwrap();
/// assert_eq!(m.shape(), &[3, 2]);
/// // All-ones factors sum each mode-1 slice
/// assert_eq!(m[[0, 0]], (0..24).filter(|x| (x / 4) % 3 == 0).sum::<i32>() as f64);
/// ```
pub fn mttkrp<T>(tensor: &DenseND<T>, factors: &[ArrayView2<T>], mode: usize) -> KernelResult<Array2<T>>
where
    T: Float + Send + Sync + 'static,
{
    let shape = tensor.shape();
    let order = shape.len();

    if mode >= order {
        return Err(KernelError::invalid_mode(
            mode,
            order,
            "mttkrp: mode must index a tensor dimension",
        ));
    }
    if factors.len() != order {
        return Err(KernelError::dimension_mismatch(
            "mttkrp",
            vec![order],
            vec![factors.len()],
            "one factor matrix per tensor mode",
        ));
    }
    check_common_rank("mttkrp", factors)?;
    for (i, factor) in factors.iter().enumerate() {
        if factor.nrows() != shape[i] {
            return Err(KernelError::dimension_mismatch(
                "mttkrp",
                vec![shape[i]],
                vec![factor.nrows()],
                format!("factor {} rows must equal tensor mode-{} size", i, i),
            ));
        }
    }

    let unfolded = tensor
        .unfold(mode)
        .map_err(|e| KernelError::matricization("mttkrp", e))?;
    let kr = khatri_rao_skip(factors, Some(mode))?;

    Ok(unfolded.dot(&kr))
}
