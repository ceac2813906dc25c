//! Norms and inner products

use super::types::DenseND;
use scirs2_core::numeric::{Float, Num};

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Frobenius norm `‖X‖ = sqrt(Σ x²)`
    ///
    /// Entries are scaled by the largest magnitude before squaring, so the
    /// result is accurate for tensors whose squared entries would underflow
    /// or overflow.
    ///
    /// ```
    /// use parafit_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::from_vec(vec![3.0, 4.0], &[2]).unwrap();
    /// assert_eq!(tensor.frobenius_norm(), 5.0);
    ///
    /// let tiny = DenseND::<f64>::from_vec(vec![3e-200, 4e-200], &[2]).unwrap();
    /// assert!((tiny.frobenius_norm() / 5e-200 - 1.0).abs() < 1e-15);
    /// ```
    pub fn frobenius_norm(&self) -> T
    where
        T: Float,
    {
        scaled_norm(self.data.iter().copied())
    }

    /// Sum of squared entries
    pub fn squared_norm(&self) -> T
    where
        T: Float,
    {
        self.data.iter().fold(T::zero(), |acc, &x| acc + x * x)
    }

    /// Elementwise inner product `⟨X, Y⟩`
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    pub fn inner(&self, other: &Self) -> anyhow::Result<T>
    where
        T: Float,
    {
        if !self.same_shape(other) {
            anyhow::bail!(
                "Inner product shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            );
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b))
    }

    /// Squared Frobenius distance `‖X − Y‖²`
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    pub fn squared_distance(&self, other: &Self) -> anyhow::Result<T>
    where
        T: Float,
    {
        if !self.same_shape(other) {
            anyhow::bail!(
                "Distance shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            );
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| {
                let d = a - b;
                acc + d * d
            }))
    }

    /// Frobenius distance `‖X − Y‖`, computed without squaring overflow
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    pub fn distance(&self, other: &Self) -> anyhow::Result<T>
    where
        T: Float,
    {
        if !self.same_shape(other) {
            anyhow::bail!(
                "Distance shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            );
        }
        Ok(scaled_norm(
            self.data.iter().zip(other.data.iter()).map(|(&a, &b)| a - b),
        ))
    }

    /// True when every entry is finite
    pub fn is_finite(&self) -> bool
    where
        T: Float,
    {
        self.data.iter().all(|x| x.is_finite())
    }
}

/// `sqrt(Σ x²)` with every value divided by the largest magnitude first
fn scaled_norm<T, I>(values: I) -> T
where
    T: Float,
    I: Iterator<Item = T> + Clone,
{
    let largest = values.clone().fold(T::zero(), |acc, x| {
        if x.is_nan() || acc.is_nan() {
            T::nan()
        } else {
            acc.max(x.abs())
        }
    });
    if largest == T::zero() || !largest.is_finite() {
        return largest;
    }
    let sum = values.fold(T::zero(), |acc, x| {
        let r = x / largest;
        acc + r * r
    });
    largest * sum.sqrt()
}

impl<T> std::ops::Sub for &DenseND<T>
where
    T: Clone + Num,
{
    type Output = DenseND<T>;

    /// Elementwise difference; panics on shape mismatch like ndarray does
    fn sub(self, rhs: Self) -> DenseND<T> {
        DenseND {
            data: &self.data - &rhs.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_and_distance() {
        let a = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let b = DenseND::from_vec(vec![0.0, 1.0, 1.0], &[3]).unwrap();
        assert_eq!(a.inner(&b).unwrap(), 5.0);
        assert_eq!(a.squared_distance(&b).unwrap(), 1.0 + 1.0 + 4.0);
        assert_eq!((&a - &b).to_vec(), vec![1.0, 1.0, 2.0]);
        assert_eq!(a.squared_norm(), 14.0);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let a = DenseND::<f64>::zeros(&[2, 3]);
        let b = DenseND::<f64>::zeros(&[3, 2]);
        assert!(a.inner(&b).is_err());
        assert!(a.squared_distance(&b).is_err());
        assert!(a.distance(&b).is_err());
    }

    #[test]
    fn test_norm_and_distance_at_extreme_scales() {
        for scale in [1e-170, 1e160] {
            let a = DenseND::from_vec(vec![3.0 * scale, 0.0, -4.0 * scale], &[3]).unwrap();
            let b = DenseND::<f64>::zeros(&[3]);
            assert!((a.frobenius_norm() / (5.0 * scale) - 1.0).abs() < 1e-14);
            assert!((a.distance(&b).unwrap() / (5.0 * scale) - 1.0).abs() < 1e-14);
        }
        assert_eq!(DenseND::<f64>::zeros(&[4]).frobenius_norm(), 0.0);

        let nan = DenseND::from_vec(vec![1.0, f64::NAN], &[2]).unwrap();
        assert!(nan.frobenius_norm().is_nan());
        let all_nan = DenseND::from_vec(vec![f64::NAN; 2], &[2]).unwrap();
        assert!(all_nan.frobenius_norm().is_nan());
    }

    #[test]
    fn test_is_finite() {
        let mut a = DenseND::<f64>::ones(&[2, 2]);
        assert!(a.is_finite());
        a[&[1, 1][..]] = f64::NAN;
        assert!(!a.is_finite());
    }
}
