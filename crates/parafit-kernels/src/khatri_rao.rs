//! Khatri-Rao product (column-wise Kronecker product)
//!
//! For matrices A (I × K) and B (J × K), C = A ⊙ B has size (I·J × K) and
//! row `i·J + j` of column k is `A[i, k] · B[j, k]`. The left operand's row
//! index varies slowest, which lines up with the column ordering of
//! `DenseND::unfold` when factors are chained in forward mode order.

use crate::error::{check_common_rank, KernelError, KernelResult};
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
#[cfg(feature = "parallel")]
use scirs2_core::ndarray_ext::Axis;
use scirs2_core::numeric::Num;

/// Rows above which the chained product switches to the parallel kernel
#[cfg(feature = "parallel")]
const PARALLEL_ROW_THRESHOLD: usize = 4096;

/// Compute the Khatri-Rao product of two matrices
///
/// # Errors
///
/// Returns [`KernelError::RankMismatch`] if the column counts differ.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use parafit_kernels::khatri_rao;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let c = khatri_rao(&a.view(), &b.view()).unwrap();
/// assert_eq!(c.shape(), &[4, 2]);
///
/// // First column: [1*5, 1*7, 3*5, 3*7]
/// assert_eq!(c[[0, 0]], 5.0);
/// assert_eq!(c[[1, 0]], 7.0);
/// assert_eq!(c[[2, 0]], 15.0);
/// assert_eq!(c[[3, 0]], 21.0);
/// ```
pub fn khatri_rao<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num,
{
    let k = check_common_rank("khatri_rao", &[a.view(), b.view()])?;
    let (i, j) = (a.nrows(), b.nrows());

    let mut result = Array2::<T>::zeros((i * j, k));
    for col_idx in 0..k {
        let a_col = a.column(col_idx);
        let b_col = b.column(col_idx);
        for (row_a_idx, a_val) in a_col.iter().enumerate() {
            for (row_b_idx, b_val) in b_col.iter().enumerate() {
                result[[row_a_idx * j + row_b_idx, col_idx]] = a_val.clone() * b_val.clone();
            }
        }
    }

    Ok(result)
}

/// Khatri-Rao product with columns computed in parallel
///
/// Same layout and errors as [`khatri_rao`].
#[cfg(feature = "parallel")]
pub fn khatri_rao_parallel<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num + Send + Sync,
{
    use scirs2_core::parallel_ops::*;

    let k = check_common_rank("khatri_rao_parallel", &[a.view(), b.view()])?;
    let (i, j) = (a.nrows(), b.nrows());

    let mut result = Array2::<T>::zeros((i * j, k));
    result
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(col_idx, mut result_col)| {
            let a_col = a.column(col_idx);
            let b_col = b.column(col_idx);
            for (row_a_idx, a_val) in a_col.iter().enumerate() {
                for (row_b_idx, b_val) in b_col.iter().enumerate() {
                    result_col[row_a_idx * j + row_b_idx] = a_val.clone() * b_val.clone();
                }
            }
        });

    Ok(result)
}

/// Chained Khatri-Rao product of all factors except `skip`
///
/// Factors are combined in forward order, `A₀ ⊙ A₁ ⊙ …` with the skipped
/// mode left out, so that `unfold(X, n) · khatri_rao_skip(A, Some(n))` is
/// the mode-n MTTKRP. With `skip = None` every factor participates.
///
/// # Errors
///
/// Returns an error if no factor remains after skipping, if `skip` is out of
/// range, or if the factors disagree on the number of columns.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use parafit_kernels::khatri_rao_skip;
///
/// let a = Array2::<f64>::ones((2, 3));
/// let b = Array2::<f64>::ones((4, 3));
/// let c = Array2::<f64>::ones((5, 3));
/// let views = [a.view(), b.view(), c.view()];
///
/// assert_eq!(khatri_rao_skip(&views, Some(1)).unwrap().shape(), &[10, 3]);
/// assert_eq!(khatri_rao_skip(&views, None).unwrap().shape(), &[40, 3]);
/// ```
pub fn khatri_rao_skip<T>(factors: &[ArrayView2<T>], skip: Option<usize>) -> KernelResult<Array2<T>>
where
    T: Clone + Num + Send + Sync,
{
    check_common_rank("khatri_rao_skip", factors)?;
    if let Some(mode) = skip {
        if mode >= factors.len() {
            return Err(KernelError::invalid_mode(
                mode,
                factors.len(),
                "khatri_rao_skip: skipped mode must index a factor",
            ));
        }
    }

    let mut remaining = factors
        .iter()
        .enumerate()
        .filter(|&(i, _)| Some(i) != skip)
        .map(|(_, f)| f);

    let mut result = remaining
        .next()
        .ok_or_else(|| KernelError::no_factors("khatri_rao_skip"))?
        .to_owned();

    for factor in remaining {
        result = khatri_rao_step(&result.view(), factor)?;
    }

    Ok(result)
}

#[cfg(feature = "parallel")]
fn khatri_rao_step<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num + Send + Sync,
{
    if a.nrows() * b.nrows() >= PARALLEL_ROW_THRESHOLD {
        khatri_rao_parallel(a, b)
    } else {
        khatri_rao(a, b)
    }
}

#[cfg(not(feature = "parallel"))]
fn khatri_rao_step<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num + Send + Sync,
{
    khatri_rao(a, b)
}
