//! Starting points for ALS
//!
//! Every initializer draws its randomness from the generator it is handed,
//! so restarts seeded differently are independent and a fixed seed
//! reproduces a run exactly.

use crate::error::{FitError, FitResult};
use crate::kruskal::{KruskalTensor, RandomDistribution};
use crate::scalar::FitScalar;
use parafit_core::DenseND;
use scirs2_core::ndarray_ext::{s, Array2};
use scirs2_core::random::rngs::StdRng;
use scirs2_linalg::svd;

/// Produces the starting model of one ALS run
pub trait Initializer<T: FitScalar>: Send + Sync {
    fn initialize(
        &self,
        tensor: &DenseND<T>,
        rank: usize,
        rng: &mut StdRng,
    ) -> FitResult<KruskalTensor<T>>;

    /// Short label recorded in the fit trace
    fn name(&self) -> &'static str;
}

/// Random factors with unit-norm columns
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInit {
    pub distribution: RandomDistribution,
}

impl RandomInit {
    pub fn new(distribution: RandomDistribution) -> Self {
        Self { distribution }
    }
}

impl<T: FitScalar> Initializer<T> for RandomInit {
    fn initialize(
        &self,
        tensor: &DenseND<T>,
        rank: usize,
        rng: &mut StdRng,
    ) -> FitResult<KruskalTensor<T>> {
        KruskalTensor::random_init_with(tensor.shape(), rank, self.distribution, rng)
    }

    fn name(&self) -> &'static str {
        match self.distribution {
            RandomDistribution::Normal => "random_normal",
            RandomDistribution::Uniform => "random_uniform",
        }
    }
}

/// Leading `rank` left singular vectors of every mode unfolding
///
/// Deterministic: the generator is not consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvdInit;

impl<T: FitScalar> Initializer<T> for SvdInit {
    fn initialize(
        &self,
        tensor: &DenseND<T>,
        rank: usize,
        _rng: &mut StdRng,
    ) -> FitResult<KruskalTensor<T>> {
        let mut factors = Vec::with_capacity(tensor.rank());
        for (mode, &mode_size) in tensor.shape().iter().enumerate() {
            if rank > mode_size {
                return Err(FitError::Rank(format!(
                    "SVD initialisation needs rank <= every mode size; rank {} > I_{} = {}",
                    rank, mode, mode_size
                )));
            }
            let unfolded = tensor
                .unfold(mode)
                .map_err(|e| FitError::ShapeMismatch(format!("unfold failed: {}", e)))?;
            let (u, _s, _vt) = svd(&unfolded.view(), false, None)?;
            if u.ncols() < rank {
                return Err(FitError::Rank(format!(
                    "mode-{} unfolding has only {} singular vectors for rank {}",
                    mode,
                    u.ncols(),
                    rank
                )));
            }
            let factor: Array2<T> = u.slice(s![.., ..rank]).to_owned();
            factors.push(factor);
        }
        KruskalTensor::with_unit_weights(factors)
    }

    fn name(&self) -> &'static str {
        "svd"
    }
}

/// A caller-supplied model, e.g. loaded from a checkpoint
#[derive(Debug, Clone)]
pub struct PrecomputedInit<T> {
    pub model: KruskalTensor<T>,
}

impl<T> PrecomputedInit<T> {
    pub fn new(model: KruskalTensor<T>) -> Self {
        Self { model }
    }
}

impl<T: FitScalar> Initializer<T> for PrecomputedInit<T> {
    fn initialize(
        &self,
        tensor: &DenseND<T>,
        rank: usize,
        _rng: &mut StdRng,
    ) -> FitResult<KruskalTensor<T>> {
        if self.model.rank() != rank {
            return Err(FitError::Rank(format!(
                "precomputed model has rank {}, fit requested rank {}",
                self.model.rank(),
                rank
            )));
        }
        if self.model.shape().as_slice() != tensor.shape() {
            return Err(FitError::ShapeMismatch(format!(
                "precomputed model shape {:?} differs from tensor shape {:?}",
                self.model.shape(),
                tensor.shape()
            )));
        }
        Ok(self.model.clone())
    }

    fn name(&self) -> &'static str {
        "precomputed"
    }
}
