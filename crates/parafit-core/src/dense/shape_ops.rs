//! Shape manipulation: reshape, permute and matricization
//!
//! The unfold/fold pair fixes the column ordering used everywhere else in the
//! stack. For mode `n` of a tensor with shape `[I₀, …, I_{N-1}]`, axis `n` is
//! moved to the front, the other axes keep their forward order, and the
//! result is reshaped row-major. Column `j` of the unfolding therefore
//! enumerates the remaining indices with the last one varying fastest, which
//! matches the row ordering of `khatri_rao_skip` in `parafit-kernels`.

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Array2, Ix2, IxDyn};
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Reshape the tensor to a new shape with the same element count
    ///
    /// ```
    /// use parafit_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// let reshaped = tensor.reshape(&[6, 4]).unwrap();
    /// assert_eq!(reshaped.shape(), &[6, 4]);
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> anyhow::Result<Self> {
        let new_size: usize = new_shape.iter().product();
        let old_size = self.len();
        if new_size != old_size {
            anyhow::bail!(
                "Cannot reshape tensor of size {} into shape {:?} (size {})",
                old_size,
                new_shape,
                new_size
            );
        }
        if let Ok(reshaped) = self.data.view().into_shape_with_order(IxDyn(new_shape)) {
            Ok(Self {
                data: reshaped.to_owned(),
            })
        } else {
            // Non-contiguous (e.g. permuted) storage: go through logical order
            Self::from_vec(self.to_vec(), new_shape)
        }
    }

    /// Permute the axes of the tensor
    ///
    /// # Errors
    ///
    /// Returns an error if `axes` is not a permutation of `0..rank`.
    pub fn permute(&self, axes: &[usize]) -> anyhow::Result<Self> {
        if axes.len() != self.rank() {
            anyhow::bail!(
                "Permutation axes length {} does not match tensor rank {}",
                axes.len(),
                self.rank()
            );
        }
        let mut seen = vec![false; self.rank()];
        for &axis in axes {
            if axis >= self.rank() {
                anyhow::bail!("Invalid axis {} for rank {}", axis, self.rank());
            }
            if seen[axis] {
                anyhow::bail!("Duplicate axis {} in permutation", axis);
            }
            seen[axis] = true;
        }
        let permuted = self.data.clone().permuted_axes(IxDyn(axes));
        Ok(Self { data: permuted })
    }

    /// Mode-n unfolding (matricization)
    ///
    /// Returns a `I_n × Π_{k≠n} I_k` matrix whose rows are indexed by the
    /// mode-`n` index.
    ///
    /// # Errors
    ///
    /// Returns an error if `mode` is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use parafit_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::from_vec(
    ///     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    ///     &[2, 3]
    /// ).unwrap();
    ///
    /// let unfolded = tensor.unfold(1).unwrap();
    /// assert_eq!(unfolded.shape(), &[3, 2]);
    /// assert_eq!(unfolded[[0, 1]], 4.0);
    /// ```
    pub fn unfold(&self, mode: usize) -> anyhow::Result<Array2<T>> {
        if mode >= self.rank() {
            anyhow::bail!("Mode {} out of bounds for rank {}", mode, self.rank());
        }

        let shape = self.shape();
        let rows = shape[mode];
        let cols: usize = shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s)
            .product();

        let mut perm: Vec<usize> = vec![mode];
        perm.extend((0..mode).chain((mode + 1)..self.rank()));

        let permuted = self.permute(&perm)?;
        let reshaped = permuted.reshape(&[rows, cols])?;

        reshaped
            .data
            .into_dimensionality::<Ix2>()
            .map_err(|e| anyhow::anyhow!("Failed to convert to 2D: {}", e))
    }

    /// Inverse of [`unfold`](Self::unfold)
    ///
    /// `fold(&t.unfold(n)?, t.shape(), n)? == t` for every mode `n`.
    ///
    /// # Errors
    ///
    /// Returns an error if `mode` is out of bounds or the matrix dimensions
    /// do not match the target shape.
    ///
    /// ```
    /// use parafit_core::DenseND;
    /// use scirs2_core::ndarray_ext::Array2;
    ///
    /// let matrix: Array2<f64> = Array2::zeros((2, 6));
    /// let tensor = DenseND::fold(&matrix, &[2, 3, 2], 0).unwrap();
    /// assert_eq!(tensor.shape(), &[2, 3, 2]);
    /// ```
    pub fn fold(matrix: &Array2<T>, shape: &[usize], mode: usize) -> anyhow::Result<Self> {
        if mode >= shape.len() {
            anyhow::bail!("Mode {} out of bounds for target shape {:?}", mode, shape);
        }

        let expected_rows = shape[mode];
        let expected_cols: usize = shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s)
            .product();

        if matrix.nrows() != expected_rows || matrix.ncols() != expected_cols {
            anyhow::bail!(
                "Matrix shape {:?} incompatible with target shape {:?} at mode {}",
                matrix.shape(),
                shape,
                mode
            );
        }

        let mut intermediate_shape = vec![shape[mode]];
        intermediate_shape.extend(
            shape
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != mode)
                .map(|(_, &s)| s),
        );

        let flat: Vec<T> = matrix.iter().cloned().collect();
        let intermediate = Self::from_vec(flat, &intermediate_shape)?;

        // Axis i of the result is axis inverse_perm[i] of the intermediate
        let mut inverse_perm = vec![0; shape.len()];
        let mut idx = 1;
        for (i, perm_val) in inverse_perm.iter_mut().enumerate() {
            if i != mode {
                *perm_val = idx;
                idx += 1;
            }
        }

        let permuted = intermediate.permute(&inverse_perm)?;
        // Hand back standard layout so later reshapes stay zero-copy
        Ok(Self {
            data: permuted.data.as_standard_layout().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(shape: &[usize]) -> DenseND<f64> {
        let n: usize = shape.iter().product();
        DenseND::from_vec((0..n).map(|x| x as f64).collect(), shape).unwrap()
    }

    #[test]
    fn test_unfold_column_order_last_mode_fastest() {
        // X[i, j, k] = 12i + 4j + k
        let t = iota(&[2, 3, 4]);
        let m0 = t.unfold(0).unwrap();
        assert_eq!(m0.shape(), &[2, 12]);
        // column j*4 + k
        assert_eq!(m0[[1, 2 * 4 + 3]], t[&[1, 2, 3][..]]);

        let m1 = t.unfold(1).unwrap();
        assert_eq!(m1.shape(), &[3, 8]);
        // column i*4 + k
        assert_eq!(m1[[2, 4 + 1]], t[&[1, 2, 1][..]]);

        let m2 = t.unfold(2).unwrap();
        assert_eq!(m2.shape(), &[4, 6]);
        // column i*3 + j
        assert_eq!(m2[[3, 3 + 2]], t[&[1, 2, 3][..]]);
    }

    #[test]
    fn test_fold_inverts_unfold_every_mode() {
        let t = iota(&[3, 2, 4, 2]);
        for mode in 0..4 {
            let m = t.unfold(mode).unwrap();
            let back = DenseND::fold(&m, t.shape(), mode).unwrap();
            assert_eq!(back, t, "mode {}", mode);
            assert!(back.is_contiguous());
        }
    }

    #[test]
    fn test_fold_rejects_wrong_dims() {
        let m: Array2<f64> = Array2::zeros((3, 5));
        assert!(DenseND::fold(&m, &[3, 2, 2], 0).is_err());
        assert!(DenseND::fold(&m, &[3, 5], 2).is_err());
    }

    #[test]
    fn test_permute_rejects_duplicates() {
        let t = iota(&[2, 3]);
        assert!(t.permute(&[0, 0]).is_err());
        assert!(t.permute(&[0]).is_err());
        let p = t.permute(&[1, 0]).unwrap();
        assert_eq!(p.shape(), &[3, 2]);
        assert_eq!(p[&[2, 1][..]], t[&[1, 2][..]]);
    }
}
