//! Tensor completion score
//!
//! For a 0/1 mask `W` marking observed entries, the error on the entries
//! that were held out:
//!
//! ```text
//! ‖(1 − W) ∘ (X − X̂)‖ / ‖(1 − W) ∘ X‖
//! ```

use crate::error::{ScoreError, ScoreResult};
use parafit_core::DenseND;
use parafit_decomp::{FitScalar, KruskalTensor};

/// Relative error of `estimate` on the entries not marked in `mask`
///
/// # Errors
///
/// [`ScoreError::ShapeMismatch`] when the three tensors differ in shape and
/// [`ScoreError::InvalidInput`] when `tensor` is zero on every held-out entry.
///
/// # Examples
///
/// ```
/// use parafit_core::DenseND;
/// use parafit_metrics::tensor_completion_score;
///
/// let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let x_hat = DenseND::from_vec(vec![1.0, 2.0, 3.0, 0.0], &[2, 2]).unwrap();
/// let observed = DenseND::from_vec(vec![1.0, 1.0, 0.0, 0.0], &[2, 2]).unwrap();
///
/// let score = tensor_completion_score(&x, &x_hat, &observed).unwrap();
/// assert!((score - 0.8).abs() < 1e-12);
/// ```
pub fn tensor_completion_score<T: FitScalar>(
    tensor: &DenseND<T>,
    estimate: &DenseND<T>,
    mask: &DenseND<T>,
) -> ScoreResult<f64> {
    if !tensor.same_shape(estimate) || !tensor.same_shape(mask) {
        return Err(ScoreError::ShapeMismatch(format!(
            "tensor {:?}, estimate {:?} and mask {:?} must share a shape",
            tensor.shape(),
            estimate.shape(),
            mask.shape()
        )));
    }

    let mut residual = 0.0;
    let mut reference = 0.0;
    for ((&x, &x_hat), &w) in tensor.iter().zip(estimate.iter()).zip(mask.iter()) {
        let held_out = 1.0 - w.to_f64_lossy();
        let x = x.to_f64_lossy();
        let diff = held_out * (x - x_hat.to_f64_lossy());
        residual += diff * diff;
        reference += (held_out * x) * (held_out * x);
    }

    if reference == 0.0 {
        return Err(ScoreError::InvalidInput(
            "tensor is zero on every held-out entry".into(),
        ));
    }
    Ok((residual / reference).sqrt())
}

/// [`tensor_completion_score`] for the reconstruction of `model`
pub fn model_completion_score<T: FitScalar>(
    tensor: &DenseND<T>,
    model: &KruskalTensor<T>,
    mask: &DenseND<T>,
) -> ScoreResult<f64> {
    let estimate = model.construct_tensor()?;
    tensor_completion_score(tensor, &estimate, mask)
}
