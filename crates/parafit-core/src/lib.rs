//! # parafit-core
//!
//! Dense N-way arrays and matricization for multilinear model fitting.
//!
//! This crate provides the storage half of the tensor algebra used by the
//! rest of the parafit stack:
//!
//! - **Dense tensor representation** ([`DenseND`]) backed by a dynamic-dimension array
//! - **Shape operations** (reshape, permute)
//! - **Matricization** (unfold/fold) with a fixed column ordering shared with
//!   the Khatri-Rao kernels in `parafit-kernels`
//! - **Seeded random creation** so that every random draw is reproducible
//!
//! ## SciRS2 Integration
//!
//! All array storage goes through `scirs2_core::ndarray_ext`, and random
//! numbers come from `scirs2_core::random` generators passed in explicitly.
//!
//! ## Quick Start
//!
//! ```
//! use parafit_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
//! assert_eq!(tensor.shape(), &[2, 3, 4]);
//! assert_eq!(tensor.rank(), 3);
//! ```
//!
//! ## Matricization (Unfold/Fold)
//!
//! Mode-n unfolding moves axis `n` to the front and keeps the remaining axes
//! in their original (forward) order before reshaping row-major. The column
//! index therefore runs fastest over the *last* remaining mode.
//!
//! ```
//! use parafit_core::DenseND;
//!
//! let tensor = DenseND::<f64>::ones(&[2, 3, 4]);
//!
//! let unfolded = tensor.unfold(1).unwrap();
//! assert_eq!(unfolded.shape(), &[3, 8]); // 8 = 2 * 4
//!
//! let folded = DenseND::fold(&unfolded, &[2, 3, 4], 1).unwrap();
//! assert_eq!(folded.shape(), &[2, 3, 4]);
//! ```
//!
//! ## Seeded Random Tensors
//!
//! ```
//! use parafit_core::DenseND;
//! use scirs2_core::random::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let a = DenseND::<f64>::random_normal_with(&[3, 4], 0.0, 1.0, &mut rng).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let b = DenseND::<f64>::random_normal_with(&[3, 4], 0.0, 1.0, &mut rng).unwrap();
//! assert_eq!(a.to_vec(), b.to_vec());
//! ```
//!
//! ## Error Handling
//!
//! Shape operations return `anyhow::Result`:
//!
//! ```
//! use parafit_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3]);
//! assert!(tensor.reshape(&[7]).is_err());
//! assert!(tensor.unfold(10).is_err());
//! ```

#![deny(warnings)]

pub mod dense;

#[cfg(test)]
mod property_tests;

pub use dense::DenseND;
