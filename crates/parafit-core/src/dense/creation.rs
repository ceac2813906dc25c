//! Tensor creation: constant fills and seeded random draws
//!
//! Random constructors never touch a global generator. The caller passes the
//! generator in, so a fit seeded once is reproducible end to end.

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Array, IxDyn};
use scirs2_core::numeric::{Float, Num, NumCast};
use scirs2_core::random::{Distribution, RandNormal, Rng};

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Create a tensor filled with `value`
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Create a tensor of zeros
    ///
    /// ```
    /// use parafit_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3]);
    /// assert!(tensor.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// Create a tensor of ones
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }
}

impl<T> DenseND<T>
where
    T: Float + NumCast,
{
    /// Create a tensor with values drawn uniformly from `[low, high)`
    ///
    /// # Examples
    ///
    /// ```
    /// use parafit_core::DenseND;
    /// use scirs2_core::random::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let tensor = DenseND::<f64>::random_uniform_with(&[2, 3], -1.0, 1.0, &mut rng);
    /// assert!(tensor.iter().all(|&x| (-1.0..1.0).contains(&x)));
    /// ```
    pub fn random_uniform_with<R: Rng>(
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Self {
        let total: usize = shape.iter().product();
        let range = high - low;
        let data: Vec<T> = (0..total)
            .map(|_| cast(low + rng.random::<f64>() * range))
            .collect();
        Self::from_flat(shape, data)
    }

    /// Create a tensor with values drawn from `N(mean, std²)`
    ///
    /// # Errors
    ///
    /// Returns an error if `std` is negative or not finite.
    pub fn random_normal_with<R: Rng>(
        shape: &[usize],
        mean: f64,
        std: f64,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let normal = RandNormal::new(mean, std)
            .map_err(|e| anyhow::anyhow!("invalid normal N({}, {}²): {:?}", mean, std, e))?;
        let total: usize = shape.iter().product();
        let data: Vec<T> = (0..total).map(|_| cast(normal.sample(&mut *rng))).collect();
        Ok(Self::from_flat(shape, data))
    }

    fn from_flat(shape: &[usize], data: Vec<T>) -> Self {
        match Array::from_shape_vec(IxDyn(shape), data) {
            Ok(data) => Self { data },
            // Length always equals the shape product here
            Err(_) => Self::zeros(shape),
        }
    }
}

fn cast<T: Float>(value: f64) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::random::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_random_normal_is_seeded() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = DenseND::<f64>::random_normal_with(&[3, 5], 0.0, 1.0, &mut rng_a).unwrap();
        let b = DenseND::<f64>::random_normal_with(&[3, 5], 0.0, 1.0, &mut rng_b).unwrap();
        assert_eq!(a.to_vec(), b.to_vec());
        assert_eq!(a.len(), 15);
        assert!(a.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_random_normal_moments() {
        let mut rng = StdRng::seed_from_u64(3);
        let t = DenseND::<f64>::random_normal_with(&[4000], 2.0, 0.5, &mut rng).unwrap();
        let n = t.len() as f64;
        let mean = t.iter().sum::<f64>() / n;
        let var = t.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 2.0).abs() < 0.05, "mean = {}", mean);
        assert!((var.sqrt() - 0.5).abs() < 0.05, "std = {}", var.sqrt());
    }

    #[test]
    fn test_random_normal_rejects_bad_std() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(DenseND::<f64>::random_normal_with(&[2], 0.0, -1.0, &mut rng).is_err());
        assert!(DenseND::<f64>::random_normal_with(&[2], 0.0, f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn test_random_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = DenseND::<f32>::random_uniform_with(&[10, 10], 2.0, 3.0, &mut rng);
        assert!(t.iter().all(|&x| (2.0..=3.0).contains(&x)));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = DenseND::<f64>::random_uniform_with(&[8], 0.0, 1.0, &mut StdRng::seed_from_u64(1));
        let b = DenseND::<f64>::random_uniform_with(&[8], 0.0, 1.0, &mut StdRng::seed_from_u64(2));
        assert_ne!(a.to_vec(), b.to_vec());
    }
}
