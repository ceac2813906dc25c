//! Kernel errors
//!
//! Shape problems are caught up front, so every variant names the
//! operation that rejected its input.

use std::fmt;

/// Failure of a kernel, reported before any arithmetic is done
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Operand shapes are incompatible
    DimensionMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: String,
    },

    /// Mode index outside the tensor or factor list
    InvalidMode {
        mode: usize,
        n_modes: usize,
        context: String,
    },

    /// Factor matrices disagree on the number of components
    RankMismatch {
        operation: String,
        expected_rank: usize,
        actual_rank: usize,
        factor_index: usize,
    },

    /// No factor matrices left to combine
    NoFactors { operation: String },

    /// Unfolding or refolding the tensor failed
    Matricization { operation: String, message: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::DimensionMismatch {
                operation,
                expected,
                actual,
                context,
            } => write!(
                f,
                "{}: dimension mismatch - expected {:?}, got {:?} ({})",
                operation, expected, actual, context
            ),
            KernelError::InvalidMode {
                mode,
                n_modes,
                context,
            } => write!(f, "mode {} out of range for {} modes ({})", mode, n_modes, context),
            KernelError::RankMismatch {
                operation,
                expected_rank,
                actual_rank,
                factor_index,
            } => write!(
                f,
                "{}: rank mismatch at factor {}: expected rank {}, got {}",
                operation, factor_index, expected_rank, actual_rank
            ),
            KernelError::NoFactors { operation } => {
                write!(f, "{}: no factor matrices to combine", operation)
            }
            KernelError::Matricization { operation, message } => {
                write!(f, "{}: matricization failed: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for KernelError {}

pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    pub fn dimension_mismatch(
        operation: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: impl Into<String>,
    ) -> Self {
        KernelError::DimensionMismatch {
            operation: operation.into(),
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn invalid_mode(mode: usize, n_modes: usize, context: impl Into<String>) -> Self {
        KernelError::InvalidMode {
            mode,
            n_modes,
            context: context.into(),
        }
    }

    pub fn rank_mismatch(
        operation: impl Into<String>,
        expected_rank: usize,
        actual_rank: usize,
        factor_index: usize,
    ) -> Self {
        KernelError::RankMismatch {
            operation: operation.into(),
            expected_rank,
            actual_rank,
            factor_index,
        }
    }

    pub fn no_factors(operation: impl Into<String>) -> Self {
        KernelError::NoFactors {
            operation: operation.into(),
        }
    }

    /// Wrap an unfold/fold error from `parafit-core`
    pub fn matricization(operation: impl Into<String>, err: impl fmt::Display) -> Self {
        KernelError::Matricization {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

/// Check that every factor has the same number of columns
pub(crate) fn check_common_rank<T>(
    operation: &str,
    factors: &[scirs2_core::ndarray_ext::ArrayView2<T>],
) -> KernelResult<usize> {
    let first = factors
        .first()
        .ok_or_else(|| KernelError::no_factors(operation))?;
    let rank = first.ncols();
    for (i, factor) in factors.iter().enumerate() {
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                operation,
                rank,
                factor.ncols(),
                i,
            ));
        }
    }
    Ok(rank)
}
