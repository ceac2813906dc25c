//! Error taxonomy for model fitting

use parafit_kernels::KernelError;
use scirs2_linalg::LinalgError;
use thiserror::Error;

/// Errors raised while building, fitting or persisting Kruskal models
#[derive(Error, Debug)]
pub enum FitError {
    /// Factor, weight or mode dimensions are inconsistent
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Non-positive or infeasible rank
    #[error("Invalid rank: {0}")]
    Rank(String),

    /// Gram matrix could not be inverted even after ridge regularization
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Loss became NaN or infinite
    #[error("Divergence at iteration {iteration}: loss = {loss}")]
    Divergence { iteration: usize, loss: f64 },

    #[error("All {restarts} restarts failed; last error: {last_error}")]
    AllRestartsDiverged { restarts: usize, last_error: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FitError {
    /// Errors after which the multi-restart driver moves on to the next start
    pub fn is_recoverable_by_restart(&self) -> bool {
        matches!(
            self,
            FitError::Divergence { .. } | FitError::NumericalInstability(_) | FitError::Linalg(_)
        )
    }
}

pub type FitResult<T> = Result<T, FitError>;
