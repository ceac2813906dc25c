//! # parafit-kernels
//!
//! Multilinear kernels behind alternating least squares fitting of Kruskal
//! (CP/PARAFAC) models.
//!
//! **Operations:**
//! - **Khatri-Rao product** - column-wise Kronecker product, pairwise and
//!   chained with one mode skipped ([`khatri_rao_skip`])
//! - **MTTKRP** - matricized tensor times Khatri-Rao product
//! - **Gram accumulators** - Hadamard product of factor Gram matrices
//! - **Reconstruction** - dense tensor from weights and factors
//! - **N-mode products** - tensor-matrix multiplication along one mode
//!
//! ## Ordering Convention
//!
//! Every kernel shares the unfolding convention of
//! [`parafit_core::DenseND::unfold`]: remaining modes in forward order, last
//! mode fastest. Chained Khatri-Rao products are formed left to right so that
//! `unfold(X, n) · khatri_rao_skip(A, Some(n))` is the mode-n MTTKRP.
//!
//! ## Quick Start
//!
//! ```rust
//! use scirs2_core::ndarray_ext::{array, Array2};
//! use parafit_core::DenseND;
//! use parafit_kernels::{cp_reconstruct, gram_hadamard, mttkrp};
//!
//! let w = array![1.0, 1.0];
//! let factors = vec![
//!     Array2::<f64>::ones((3, 2)),
//!     Array2::<f64>::ones((4, 2)),
//!     Array2::<f64>::ones((5, 2)),
//! ];
//! let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
//!
//! let x = cp_reconstruct(&w.view(), &views).unwrap();
//! assert_eq!(x.shape(), &[3, 4, 5]);
//!
//! let m = mttkrp(&x, &views, 1).unwrap();
//! let v = gram_hadamard(&views, Some(1)).unwrap();
//! assert_eq!(m.shape(), &[4, 2]);
//! assert_eq!(v.shape(), &[2, 2]);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default) - column-parallel Khatri-Rao for large chained products
//!
//! ## Errors
//!
//! All fallible kernels return [`KernelResult`]; shape problems are reported
//! eagerly before any arithmetic.

#![deny(warnings)]

pub mod error;
pub mod hadamard;
pub mod khatri_rao;
pub mod mttkrp;
pub mod nmode;
pub mod outer;


pub use error::{KernelError, KernelResult};
pub use hadamard::*;
pub use khatri_rao::*;
pub use mttkrp::*;
pub use nmode::*;
pub use outer::*;
