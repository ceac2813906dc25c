//! Reconstruction of a dense tensor from Kruskal (CP) factors

use crate::error::{check_common_rank, KernelError, KernelResult};
use crate::khatri_rao::khatri_rao_skip;
use parafit_core::DenseND;
use scirs2_core::ndarray_ext::{Array2, ArrayView1, ArrayView2, Axis};
use scirs2_core::numeric::Float;

/// Build `Σ_r w_r · a₀ᵣ ∘ a₁ᵣ ∘ … ∘ a_{N-1}ᵣ` as a dense tensor
///
/// Computed as `fold((A₀ · diag(w)) · khatri_rao_skip(A, Some(0))ᵀ, shape, 0)`
/// rather than summing outer products one component at a time.
///
/// # Errors
///
/// Returns an error if there are fewer than two factors, the factors disagree
/// on the number of columns, or `weights.len()` differs from it.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use parafit_kernels::cp_reconstruct;
///
/// let w = array![2.0];
/// let a = array![[1.0], [2.0]];
/// let b = array![[3.0], [4.0], [5.0]];
///
/// let x = cp_reconstruct(&w.view(), &[a.view(), b.view()]).unwrap();
/// assert_eq!(x.shape(), &[2, 3]);
/// assert_eq!(x[&[1, 2][..]], 2.0 * 2.0 * 5.0);
/// ```
pub fn cp_reconstruct<T>(weights: &ArrayView1<T>, factors: &[ArrayView2<T>]) -> KernelResult<DenseND<T>>
where
    T: Float + Send + Sync + 'static,
{
    let rank = check_common_rank("cp_reconstruct", factors)?;
    if factors.len() < 2 {
        return Err(KernelError::dimension_mismatch(
            "cp_reconstruct",
            vec![2],
            vec![factors.len()],
            "at least two factor matrices are required",
        ));
    }
    if weights.len() != rank {
        return Err(KernelError::rank_mismatch(
            "cp_reconstruct",
            rank,
            weights.len(),
            0,
        ));
    }

    let shape: Vec<usize> = factors.iter().map(|f| f.nrows()).collect();

    let mut scaled: Array2<T> = factors[0].to_owned();
    for (mut column, &w) in scaled.axis_iter_mut(Axis(1)).zip(weights.iter()) {
        column.mapv_inplace(|x| x * w);
    }

    let kr = khatri_rao_skip(factors, Some(0))?;
    let unfolded = scaled.dot(&kr.t());

    DenseND::fold(&unfolded, &shape, 0)
        .map_err(|e| KernelError::matricization("cp_reconstruct", e))
}
