//! Kruskal tensor model: component weights plus one factor matrix per mode
//!
//! A rank-R model of an N-way tensor is
//!
//! X̂ = Σᵣ λᵣ (a₀ᵣ ∘ a₁ᵣ ∘ … ∘ a_{N-1,r})
//!
//! with `weights = λ` (length R) and `factors[n]` of shape `(I_n, R)`.
//! Every constructor checks rank consistency up front, so a model that
//! exists is always well formed.

use crate::error::{FitError, FitResult};
use crate::scalar::FitScalar;
use parafit_core::DenseND;
use parafit_kernels::cp_reconstruct;
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayView1, Axis};
use scirs2_core::random::{rngs::StdRng, Distribution, RandNormal, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Distribution used for random factor entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomDistribution {
    /// Standard normal N(0, 1)
    #[default]
    Normal,
    /// Uniform on [0, 1)
    Uniform,
}

/// Weights and factor matrices of a CP/PARAFAC model
#[derive(Debug, Clone, PartialEq)]
pub struct KruskalTensor<T> {
    weights: Array1<T>,
    factors: Vec<Array2<T>>,
}

impl<T: FitScalar> KruskalTensor<T> {
    /// Build a model from factor matrices and weights
    ///
    /// # Errors
    ///
    /// - [`FitError::ShapeMismatch`] if there are fewer than two factors, the
    ///   factors disagree on the number of columns, or `weights.len()` differs
    ///   from it
    /// - [`FitError::Rank`] if the factors have zero columns
    /// - [`FitError::InvalidConfig`] if a weight is negative or NaN; signs
    ///   live in the factor columns
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::{array, Array2};
    /// use parafit_decomp::KruskalTensor;
    ///
    /// let a = Array2::<f64>::ones((3, 2));
    /// let b = Array2::<f64>::ones((4, 2));
    /// let model = KruskalTensor::new(vec![a, b], array![1.0, 2.0]).unwrap();
    /// assert_eq!(model.rank(), 2);
    /// assert_eq!(model.shape(), vec![3, 4]);
    ///
    /// let bad = KruskalTensor::new(vec![Array2::<f64>::ones((3, 2))], array![1.0]);
    /// assert!(bad.is_err());
    /// ```
    pub fn new(factors: Vec<Array2<T>>, weights: Array1<T>) -> FitResult<Self> {
        if factors.len() < 2 {
            return Err(FitError::ShapeMismatch(format!(
                "a Kruskal model needs at least 2 factor matrices, got {}",
                factors.len()
            )));
        }
        let rank = factors[0].ncols();
        for (n, factor) in factors.iter().enumerate() {
            if factor.ncols() != rank {
                return Err(FitError::ShapeMismatch(format!(
                    "factor {} has {} columns, factor 0 has {}",
                    n,
                    factor.ncols(),
                    rank
                )));
            }
        }
        if rank == 0 {
            return Err(FitError::Rank("model rank must be positive".into()));
        }
        if weights.len() != rank {
            return Err(FitError::ShapeMismatch(format!(
                "{} weights for a rank-{} model",
                weights.len(),
                rank
            )));
        }
        if let Some(w) = weights.iter().find(|&&w| w.is_nan() || w < T::zero()) {
            return Err(FitError::InvalidConfig(format!(
                "component weights must be non-negative, got {}",
                w
            )));
        }
        Ok(Self { weights, factors })
    }

    /// Build a model whose weights are all one
    pub fn with_unit_weights(factors: Vec<Array2<T>>) -> FitResult<Self> {
        let rank = factors.first().map(|f| f.ncols()).unwrap_or(0);
        Self::new(factors, Array1::ones(rank))
    }

    /// Random model with unit-norm columns and unit weights
    ///
    /// Entries are drawn i.i.d. from N(0, 1) by a generator seeded with
    /// `seed`, so equal seeds give equal models.
    ///
    /// ```
    /// use parafit_decomp::KruskalTensor;
    ///
    /// let a = KruskalTensor::<f64>::random_init(&[4, 5, 6], 3, 9).unwrap();
    /// let b = KruskalTensor::<f64>::random_init(&[4, 5, 6], 3, 9).unwrap();
    /// assert_eq!(a, b);
    /// assert!(a.weights().iter().all(|&w| w == 1.0));
    /// ```
    pub fn random_init(shape: &[usize], rank: usize, seed: u64) -> FitResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random_init_with(shape, rank, RandomDistribution::Normal, &mut rng)
    }

    /// Random model drawn from `distribution` using a caller-owned generator
    pub fn random_init_with(
        shape: &[usize],
        rank: usize,
        distribution: RandomDistribution,
        rng: &mut StdRng,
    ) -> FitResult<Self> {
        if rank == 0 {
            return Err(FitError::Rank("model rank must be positive".into()));
        }
        if shape.iter().any(|&d| d == 0) {
            return Err(FitError::ShapeMismatch(format!(
                "cannot draw factors for shape {:?} with an empty mode",
                shape
            )));
        }

        let mut factors = Vec::with_capacity(shape.len());
        match distribution {
            RandomDistribution::Normal => {
                let normal = RandNormal::new(0.0, 1.0).map_err(|e| {
                    FitError::InvalidConfig(format!("normal distribution: {:?}", e))
                })?;
                for &mode_size in shape {
                    let factor = Array2::from_shape_fn((mode_size, rank), |_| {
                        cast::<T>(normal.sample(&mut *rng))
                    });
                    factors.push(factor);
                }
            }
            RandomDistribution::Uniform => {
                for &mode_size in shape {
                    let factor =
                        Array2::from_shape_fn((mode_size, rank), |_| cast::<T>(rng.random::<f64>()));
                    factors.push(factor);
                }
            }
        }

        let mut model = Self::with_unit_weights(factors)?;
        model.normalize();
        model.weights.fill(T::one());
        Ok(model)
    }

    pub fn rank(&self) -> usize {
        self.weights.len()
    }

    pub fn n_modes(&self) -> usize {
        self.factors.len()
    }

    /// Mode dimensions `[I₀, …, I_{N-1}]`
    pub fn shape(&self) -> Vec<usize> {
        self.factors.iter().map(|f| f.nrows()).collect()
    }

    pub fn weights(&self) -> &Array1<T> {
        &self.weights
    }

    pub fn factors(&self) -> &[Array2<T>] {
        &self.factors
    }

    pub fn factor(&self, mode: usize) -> Option<&Array2<T>> {
        self.factors.get(mode)
    }

    pub fn into_parts(self) -> (Array1<T>, Vec<Array2<T>>) {
        (self.weights, self.factors)
    }

    /// Replace the factor of `mode`, keeping its shape
    pub(crate) fn set_factor(&mut self, mode: usize, factor: Array2<T>) -> FitResult<()> {
        let current = self.factors.get(mode).ok_or_else(|| {
            FitError::ShapeMismatch(format!("mode {} out of range", mode))
        })?;
        if current.dim() != factor.dim() {
            return Err(FitError::ShapeMismatch(format!(
                "mode-{} factor update has shape {:?}, expected {:?}",
                mode,
                factor.dim(),
                current.dim()
            )));
        }
        self.factors[mode] = factor;
        Ok(())
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Array1<T> {
        &mut self.weights
    }

    /// Dense reconstruction `Σᵣ λᵣ a₀ᵣ ∘ … ∘ a_{N-1,r}`
    pub fn construct_tensor(&self) -> FitResult<DenseND<T>> {
        let views: Vec<_> = self.factors.iter().map(|f| f.view()).collect();
        Ok(cp_reconstruct(&self.weights.view(), &views)?)
    }

    /// Rescale every factor column to unit norm, moving the scale into the weights
    ///
    /// A column with zero norm is left as is and its weight becomes zero.
    /// The reconstruction is unchanged up to rounding.
    pub fn normalize(&mut self) {
        for factor in &mut self.factors {
            for (r, mut column) in factor.axis_iter_mut(Axis(1)).enumerate() {
                let norm = column_norm(column.view());
                if norm > T::zero() && norm.is_finite() {
                    column.mapv_inplace(|x| x / norm);
                    self.weights[r] *= norm;
                } else if norm == T::zero() {
                    self.weights[r] = T::zero();
                }
            }
        }
    }

    /// Normalised copy; `self` is not modified
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Reorder components so that new component `i` is old component `perm[i]`
    ///
    /// # Errors
    ///
    /// Returns [`FitError::ShapeMismatch`] if `perm` is not a permutation of
    /// `0..rank`.
    pub fn permute_components(&mut self, perm: &[usize]) -> FitResult<()> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        if perm.len() != rank {
            return Err(FitError::ShapeMismatch(format!(
                "permutation of length {} for rank {}",
                perm.len(),
                rank
            )));
        }
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(FitError::ShapeMismatch(format!(
                    "{:?} is not a permutation of 0..{}",
                    perm, rank
                )));
            }
            seen[p] = true;
        }

        self.weights = perm.iter().map(|&p| self.weights[p]).collect();
        for factor in &mut self.factors {
            *factor = factor.select(Axis(1), perm);
        }
        Ok(())
    }

    /// Deterministic sign convention for comparing models
    ///
    /// For each mode except the last, a column whose entries are mostly
    /// negative (mean of signs below zero) is flipped, and the same column of
    /// the last mode is flipped with it, so the reconstruction is unchanged.
    pub fn align_signs(&mut self) {
        let n_modes = self.n_modes();
        let rank = self.rank();
        for mode in 0..n_modes - 1 {
            for r in 0..rank {
                let sign_sum: T = self.factors[mode]
                    .column(r)
                    .iter()
                    .map(|&x| sign(x))
                    .sum();
                if sign_sum < T::zero() {
                    self.factors[mode].column_mut(r).mapv_inplace(|x| -x);
                    self.factors[n_modes - 1]
                        .column_mut(r)
                        .mapv_inplace(|x| -x);
                }
            }
        }
    }

    fn check_data_shape(&self, tensor: &DenseND<T>) -> FitResult<()> {
        if tensor.shape() != self.shape().as_slice() {
            return Err(FitError::ShapeMismatch(format!(
                "data shape {:?} differs from model shape {:?}",
                tensor.shape(),
                self.shape()
            )));
        }
        Ok(())
    }

    /// Sum of squared errors `‖X − X̂‖²`
    pub fn sse(&self, tensor: &DenseND<T>) -> FitResult<T> {
        self.check_data_shape(tensor)?;
        let estimate = self.construct_tensor()?;
        estimate
            .squared_distance(tensor)
            .map_err(|e| FitError::ShapeMismatch(e.to_string()))
    }

    /// Mean squared error over all entries
    pub fn mse(&self, tensor: &DenseND<T>) -> FitResult<T> {
        let n = cast::<T>(tensor.len() as f64);
        Ok(self.sse(tensor)? / n)
    }

    pub fn rmse(&self, tensor: &DenseND<T>) -> FitResult<T> {
        Ok(self.mse(tensor)?.sqrt())
    }

    /// Relative error `‖X − X̂‖ / ‖X‖`, the loss minimised by ALS
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NumericalInstability`] if `tensor` is all zeros.
    pub fn relative_error(&self, tensor: &DenseND<T>) -> FitResult<T> {
        let norm = nonzero_norm(tensor)?;
        self.check_data_shape(tensor)?;
        let residual = self
            .construct_tensor()?
            .distance(tensor)
            .map_err(|e| FitError::ShapeMismatch(e.to_string()))?;
        Ok(residual / norm)
    }

    /// Fraction of the data's sum of squares explained, `1 − SSE / ‖X‖²`
    pub fn explained_variance(&self, tensor: &DenseND<T>) -> FitResult<T> {
        let ratio = self.relative_error(tensor)?;
        Ok(T::one() - ratio * ratio)
    }

    /// All factor entries, mode by mode, each factor row-major
    ///
    /// Weights are not included.
    pub fn to_flat_parameters(&self) -> Vec<T> {
        self.factors
            .iter()
            .flat_map(|f| f.iter().copied())
            .collect()
    }

    /// Inverse of [`to_flat_parameters`](Self::to_flat_parameters); weights are set to one
    pub fn from_flat_parameters(flat: &[T], rank: usize, dims: &[usize]) -> FitResult<Self> {
        let expected = dims
            .iter()
            .try_fold(0usize, |acc, &d| d.checked_mul(rank)?.checked_add(acc))
            .ok_or_else(|| {
                FitError::ShapeMismatch(format!(
                    "dims {:?} at rank {} overflow the parameter count",
                    dims, rank
                ))
            })?;
        if flat.len() != expected {
            return Err(FitError::ShapeMismatch(format!(
                "{} parameters for dims {:?} at rank {} (expected {})",
                flat.len(),
                dims,
                rank,
                expected
            )));
        }
        let mut offset = 0;
        let mut factors = Vec::with_capacity(dims.len());
        for &dim in dims {
            let len = dim * rank;
            let factor = Array2::from_shape_vec((dim, rank), flat[offset..offset + len].to_vec())
                .map_err(|e| FitError::ShapeMismatch(e.to_string()))?;
            factors.push(factor);
            offset += len;
        }
        Self::with_unit_weights(factors)
    }
}

fn nonzero_norm<T: FitScalar>(tensor: &DenseND<T>) -> FitResult<T> {
    let norm = tensor.frobenius_norm();
    if norm == T::zero() {
        return Err(FitError::NumericalInstability(
            "reference tensor has zero norm".into(),
        ));
    }
    Ok(norm)
}

fn sign<T: FitScalar>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Euclidean norm of a column, scaled by its largest entry so that neither
/// tiny nor huge entries underflow or overflow when squared
pub(crate) fn column_norm<T: FitScalar>(column: ArrayView1<T>) -> T {
    let largest = column.iter().fold(T::zero(), |acc, &x| {
        if x.is_nan() || acc.is_nan() {
            T::nan()
        } else {
            acc.max(x.abs())
        }
    });
    if largest == T::zero() || !largest.is_finite() {
        return largest;
    }
    let sum: T = column
        .iter()
        .map(|&x| {
            let r = x / largest;
            r * r
        })
        .sum();
    largest * sum.sqrt()
}

pub(crate) fn cast<T: FitScalar>(value: f64) -> T {
    T::from_f64_checked(value).unwrap_or_else(T::nan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;

    fn sample_model() -> KruskalTensor<f64> {
        let a = array![[1.0, -2.0], [2.0, 0.5], [-1.0, 1.0]];
        let b = array![[0.5, 1.0], [1.5, -1.0]];
        let c = array![[2.0, 1.0], [-1.0, 3.0], [0.0, 1.0], [1.0, 1.0]];
        KruskalTensor::new(vec![a, b, c], array![1.5, 0.75]).unwrap()
    }

    fn max_abs_diff(a: &DenseND<f64>, b: &DenseND<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_new_rejects_inconsistent_rank() {
        let a = Array2::<f64>::ones((3, 2));
        let b = Array2::<f64>::ones((4, 3));
        let err = KruskalTensor::with_unit_weights(vec![a.clone(), b]).unwrap_err();
        assert!(matches!(err, FitError::ShapeMismatch(_)));

        let err = KruskalTensor::new(vec![a.clone(), a], array![1.0]).unwrap_err();
        assert!(matches!(err, FitError::ShapeMismatch(_)));

        let empty = Array2::<f64>::zeros((3, 0));
        let err = KruskalTensor::with_unit_weights(vec![empty.clone(), empty]).unwrap_err();
        assert!(matches!(err, FitError::Rank(_)));
    }

    #[test]
    fn test_normalize_preserves_reconstruction() {
        let model = sample_model();
        let before = model.construct_tensor().unwrap();
        let normalized = model.normalized();
        let after = normalized.construct_tensor().unwrap();
        assert!(max_abs_diff(&before, &after) < 1e-12);

        for factor in normalized.factors() {
            for column in factor.columns() {
                let norm: f64 = column.iter().map(|x| x * x).sum::<f64>().sqrt();
                assert!((norm - 1.0).abs() < 1e-12);
            }
        }
        // The original is untouched
        assert_eq!(model, sample_model());
    }

    #[test]
    fn test_normalize_zero_column() {
        let a = array![[0.0, 1.0], [0.0, 1.0]];
        let b = array![[1.0, 1.0], [2.0, 0.0]];
        let mut model = KruskalTensor::<f64>::with_unit_weights(vec![a, b]).unwrap();
        model.normalize();
        assert_eq!(model.weights()[0], 0.0);
        assert!(model.factors()[0].iter().all(|x| x.is_finite()));
        assert!(model.weights().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_random_init_unit_columns() {
        let mut rng = StdRng::seed_from_u64(4);
        for dist in [RandomDistribution::Normal, RandomDistribution::Uniform] {
            let model =
                KruskalTensor::<f64>::random_init_with(&[5, 6, 7], 3, dist, &mut rng).unwrap();
            assert_eq!(model.shape(), vec![5, 6, 7]);
            assert_eq!(model.weights(), &Array1::<f64>::ones(3));
            for factor in model.factors() {
                for column in factor.columns() {
                    let norm: f64 = column.iter().map(|x| x * x).sum::<f64>().sqrt();
                    assert!((norm - 1.0).abs() < 1e-12);
                }
            }
        }
        assert!(matches!(
            KruskalTensor::<f64>::random_init(&[3, 0], 1, 0),
            Err(FitError::ShapeMismatch(_))
        ));
        assert!(matches!(
            KruskalTensor::<f64>::random_init(&[3, 3], 0, 0),
            Err(FitError::Rank(_))
        ));
    }

    #[test]
    fn test_different_seeds_give_different_models() {
        let a = KruskalTensor::<f64>::random_init(&[4, 4], 2, 1).unwrap();
        let b = KruskalTensor::<f64>::random_init(&[4, 4], 2, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_permute_components() {
        let model = sample_model();
        let mut permuted = model.clone();
        permuted.permute_components(&[1, 0]).unwrap();
        assert_eq!(permuted.weights()[0], model.weights()[1]);
        assert_eq!(permuted.factors()[2].column(0), model.factors()[2].column(1));
        let x = model.construct_tensor().unwrap();
        let y = permuted.construct_tensor().unwrap();
        assert!(max_abs_diff(&x, &y) < 1e-12);

        assert!(permuted.permute_components(&[0, 0]).is_err());
        assert!(permuted.permute_components(&[0]).is_err());
    }

    #[test]
    fn test_align_signs_preserves_reconstruction() {
        let mut model = sample_model();
        let before = model.construct_tensor().unwrap();
        model.align_signs();
        let after = model.construct_tensor().unwrap();
        assert!(max_abs_diff(&before, &after) < 1e-12);
        for mode in 0..model.n_modes() - 1 {
            for column in model.factors()[mode].columns() {
                let s: f64 = column.iter().map(|&x| sign(x)).sum();
                assert!(s >= 0.0);
            }
        }
    }

    #[test]
    fn test_diagnostics_of_exact_model() {
        let model = sample_model();
        let x = model.construct_tensor().unwrap();
        assert!(model.sse(&x).unwrap() < 1e-20);
        assert!(model.relative_error(&x).unwrap() < 1e-10);
        assert!((model.explained_variance(&x).unwrap() - 1.0).abs() < 1e-12);

        let zeros = DenseND::<f64>::zeros(&[3, 2, 4]);
        let sse = model.sse(&zeros).unwrap();
        assert!((sse - x.squared_norm()).abs() < 1e-9);
        assert!((model.mse(&zeros).unwrap() - sse / 24.0).abs() < 1e-12);
        assert!((model.rmse(&zeros).unwrap() - (sse / 24.0).sqrt()).abs() < 1e-12);
        assert!(matches!(
            model.relative_error(&zeros),
            Err(FitError::NumericalInstability(_))
        ));

        let wrong = DenseND::<f64>::zeros(&[3, 2]);
        assert!(matches!(model.sse(&wrong), Err(FitError::ShapeMismatch(_))));
    }

    #[test]
    fn test_negative_weights_rejected() {
        let a = Array2::<f64>::ones((3, 2));
        let b = Array2::<f64>::ones((4, 2));
        for bad in [-1.0, f64::NAN] {
            let err = KruskalTensor::new(vec![a.clone(), b.clone()], array![1.0, bad]).unwrap_err();
            assert!(matches!(err, FitError::InvalidConfig(_)));
        }
        assert!(KruskalTensor::new(vec![a, b], array![0.0, 2.0]).is_ok());
    }

    #[test]
    fn test_column_norm_survives_extreme_scales() {
        for scale in [1e-200, 1.0, 1e200] {
            let column: Array1<f64> = array![3.0 * scale, 4.0 * scale];
            let norm = column_norm(column.view());
            assert!((norm / (5.0 * scale) - 1.0).abs() < 1e-14, "scale {}", scale);
        }
        assert_eq!(column_norm(Array1::<f64>::zeros(3).view()), 0.0);
    }

    #[test]
    fn test_relative_error_at_tiny_scale() {
        let model = sample_model();
        let x = model.construct_tensor().unwrap();
        let tiny = DenseND::from_array(x.as_array().mapv(|v| v * 1e-170));
        let zeros = DenseND::<f64>::zeros(&[3, 2, 4]);
        let far = KruskalTensor::new(model.factors().to_vec(), array![0.0, 0.0]).unwrap();
        assert!((far.relative_error(&tiny).unwrap() - 1.0).abs() < 1e-12);
        assert!(far.relative_error(&zeros).is_err());
    }

    #[test]
    fn test_flat_parameter_count_overflow() {
        let err = KruskalTensor::<f64>::from_flat_parameters(&[1.0], usize::MAX, &[2, 3]).unwrap_err();
        assert!(matches!(err, FitError::ShapeMismatch(_)));
    }

    #[test]
    fn test_flat_parameters_round_trip() {
        let model = sample_model().normalized();
        let flat = model.to_flat_parameters();
        assert_eq!(flat.len(), (3 + 2 + 4) * 2);
        let back = KruskalTensor::from_flat_parameters(&flat, 2, &[3, 2, 4]).unwrap();
        assert_eq!(back.factors(), model.factors());
        assert!(KruskalTensor::<f64>::from_flat_parameters(&flat[1..], 2, &[3, 2, 4]).is_err());
    }
}
