//! Hadamard (element-wise) products and Gram accumulators
//!
//! The ALS normal equations for mode n use
//!
//! V = ⊛_{m≠n} (A_mᵀ A_m)
//!
//! an R × R matrix that never touches the full tensor.

use crate::error::{check_common_rank, KernelError, KernelResult};
use scirs2_core::ndarray_ext::{Array2, ArrayView2, ArrayViewMut2};
use scirs2_core::numeric::{Float, Num};

/// Element-wise product of two matrices of equal shape
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use parafit_kernels::hadamard;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let c = hadamard(&a.view(), &b.view()).unwrap();
/// assert_eq!(c, array![[5.0, 12.0], [21.0, 32.0]]);
/// ```
pub fn hadamard<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Clone + Num,
{
    let mut result = a.to_owned();
    hadamard_inplace(&mut result.view_mut(), b)?;
    Ok(result)
}

/// In-place element-wise product, `a ← a ⊛ b`
pub fn hadamard_inplace<T>(a: &mut ArrayViewMut2<T>, b: &ArrayView2<T>) -> KernelResult<()>
where
    T: Clone + Num,
{
    if a.shape() != b.shape() {
        return Err(KernelError::dimension_mismatch(
            "hadamard",
            a.shape().to_vec(),
            b.shape().to_vec(),
            "operands must have identical shapes",
        ));
    }
    a.zip_mut_with(b, |x, y| *x = x.clone() * y.clone());
    Ok(())
}

/// Gram matrix `AᵀA`
pub fn gram<T>(a: &ArrayView2<T>) -> Array2<T>
where
    T: Float + 'static,
{
    a.t().dot(a)
}

/// Hadamard product of the Gram matrices of all factors except `skip`
///
/// With `skip = None` every factor contributes; the result is then the Gram
/// matrix of the full Khatri-Rao product, which is what the squared norm of a
/// Kruskal tensor is built from.
///
/// # Errors
///
/// Returns an error if the factor list is empty, `skip` is out of range, or
/// the factors disagree on the number of columns.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use parafit_kernels::gram_hadamard;
///
/// let a = array![[1.0, 0.0], [0.0, 2.0]];
/// let b = array![[1.0, 1.0], [1.0, 1.0]];
/// let v = gram_hadamard(&[a.view(), b.view()], Some(1)).unwrap();
/// assert_eq!(v, array![[1.0, 0.0], [0.0, 4.0]]);
/// ```
pub fn gram_hadamard<T>(factors: &[ArrayView2<T>], skip: Option<usize>) -> KernelResult<Array2<T>>
where
    T: Float + 'static,
{
    let rank = check_common_rank("gram_hadamard", factors)?;
    if let Some(mode) = skip {
        if mode >= factors.len() {
            return Err(KernelError::invalid_mode(
                mode,
                factors.len(),
                "gram_hadamard: skipped mode must index a factor",
            ));
        }
    }

    let mut v = Array2::<T>::ones((rank, rank));
    for (i, factor) in factors.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        let g = gram(factor);
        hadamard_inplace(&mut v.view_mut(), &g.view())?;
    }
    Ok(v)
}
