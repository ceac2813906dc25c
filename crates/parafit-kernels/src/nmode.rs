//! N-mode product (tensor times matrix)
//!
//! For X ∈ ℝ^(I₀×…×I_{N-1}) and M ∈ ℝ^(J×Iₙ), Y = X ×ₙ M has shape
//! (I₀, …, J, …, I_{N-1}) and Y_(n) = M · X_(n).

use crate::error::{KernelError, KernelResult};
use parafit_core::DenseND;
use scirs2_core::ndarray_ext::ArrayView2;
use scirs2_core::numeric::Float;

/// Multiply `tensor` by `matrix` along `mode`
///
/// # Errors
///
/// Returns an error if `mode` is out of bounds or the matrix column count
/// differs from the mode size.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use parafit_core::DenseND;
/// use parafit_kernels::nmode_product;
///
/// let tensor = DenseND::<f64>::ones(&[3, 4, 5]);
/// let matrix = Array2::<f64>::ones((2, 4));
/// let y = nmode_product(&tensor, &matrix.view(), 1).unwrap();
/// assert_eq!(y.shape(), &[3, 2, 5]);
/// assert_eq!(y[&[0, 0, 0][..]], 4.0);
/// ```
pub fn nmode_product<T>(tensor: &DenseND<T>, matrix: &ArrayView2<T>, mode: usize) -> KernelResult<DenseND<T>>
where
    T: Float + 'static,
{
    let shape = tensor.shape();
    if mode >= shape.len() {
        return Err(KernelError::invalid_mode(
            mode,
            shape.len(),
            "nmode_product: mode must index a tensor dimension",
        ));
    }
    if matrix.ncols() != shape[mode] {
        return Err(KernelError::dimension_mismatch(
            "nmode_product",
            vec![matrix.nrows(), shape[mode]],
            matrix.shape().to_vec(),
            format!("matrix columns must equal tensor mode-{} size", mode),
        ));
    }

    let unfolded = tensor
        .unfold(mode)
        .map_err(|e| KernelError::matricization("nmode_product", e))?;
    let product = matrix.dot(&unfolded);

    let mut new_shape = shape.to_vec();
    new_shape[mode] = matrix.nrows();

    DenseND::fold(&product, &new_shape, mode)
        .map_err(|e| KernelError::matricization("nmode_product", e))
}
