//! Errors raised while scoring models

use parafit_decomp::FitError;
use parafit_kernels::KernelError;
use scirs2_linalg::LinalgError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    /// Models or tensors being compared do not have matching ranks or shapes
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Input the score is undefined for, such as non-finite similarities
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Fit(#[from] FitError),
}

pub type ScoreResult<T> = Result<T, ScoreError>;
