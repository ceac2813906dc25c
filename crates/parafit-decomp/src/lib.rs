//! # parafit-decomp - Kruskal models fitted by alternating least squares
//!
//! Fits the rank-R CP (CANDECOMP/PARAFAC) model
//!
//! ```text
//! X ≈ Σᵣ λᵣ (a₁ᵣ ⊗ a₂ᵣ ⊗ ... ⊗ aₙᵣ)
//! ```
//!
//! to a dense tensor, restarting from several seeded starting points and
//! keeping the best fit.
//!
//! ## Components
//!
//! - [`KruskalTensor`]: weights plus one factor matrix per mode, with
//!   reconstruction, normalisation, component permutation and fit diagnostics
//! - [`Initializer`]: starting points ([`RandomInit`], [`SvdInit`],
//!   [`PrecomputedInit`])
//! - [`CpAls`]: one ALS run as an explicit state machine, reporting a
//!   [`FitTrace`]
//! - [`cp_als_fit`]: multi-restart driver returning a [`CpFit`]
//! - [`KruskalCheckpoint`]: JSON and binary persistence of fitted models
//!
//! ## Quick Start
//!
//! ```
//! use parafit_decomp::{cp_als_fit, FitConfig, KruskalTensor};
//!
//! // Exact rank-2 tensor
//! let truth = KruskalTensor::<f64>::random_init(&[8, 9, 10], 2, 1).unwrap();
//! let tensor = truth.construct_tensor().unwrap();
//!
//! let config = FitConfig::default()
//!     .with_n_restarts(3)
//!     .with_max_iterations(500)
//!     .with_seed(42);
//! let fit = cp_als_fit(&tensor, 2, &config).unwrap();
//!
//! println!(
//!     "restart {} won: loss {:.2e} after {} iterations",
//!     fit.best_restart,
//!     fit.final_loss(),
//!     fit.trace.iterations
//! );
//! assert!(fit.final_loss() < 1e-3);
//! ```
//!
//! ## Numerical Safeguards
//!
//! Each mode update solves `A · V = M` against the Gram accumulator `V`
//! with a least-squares solve per row; the SVD of `V` only estimates its
//! condition number. When `V` is ill-conditioned a ridge term
//! `λ = ridge · max(1, σ_max)` is added and a [`FitWarning::RidgeEngaged`]
//! is recorded. Modes flagged in [`FitConfig::non_negative_modes`] use a
//! non-negative least-squares update instead. A run whose loss becomes NaN or
//! infinite ends with [`FitError::Divergence`]; the restart driver logs it
//! and moves on, failing only when every restart failed.
//!
//! ## Features
//!
//! - `parallel` (default) - restarts run concurrently on the `scirs2_core`
//!   thread pool

#![deny(warnings)]

pub mod als;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fit;
pub mod init;
pub mod kruskal;
pub mod scalar;
mod solve;

#[cfg(test)]
mod property_tests;

pub use als::{AlsState, CpAls, FitTrace, FitWarning, Termination};
pub use checkpoint::{KruskalCheckpoint, CHECKPOINT_FORMAT, CHECKPOINT_VERSION};
pub use config::{FitConfig, InitMethod};
pub use error::{FitError, FitResult};
pub use fit::{cp_als_fit, cp_als_fit_with, CpFit, RestartSummary};
pub use init::{Initializer, PrecomputedInit, RandomInit, SvdInit};
pub use kruskal::{KruskalTensor, RandomDistribution};
pub use scalar::FitScalar;
