//! # parafit - CP/PARAFAC fitting by multi-restart ALS
//!
//! This is the **meta crate** that re-exports the parafit components.
//!
//! ## Quick Start
//!
//! ```
//! use parafit::prelude::*;
//!
//! // Exact rank-3 tensor from known factors
//! let truth = KruskalTensor::<f64>::random_init(&[10, 12, 14], 3, 42).unwrap();
//! let tensor = truth.construct_tensor().unwrap();
//!
//! let config = FitConfig::default().with_n_restarts(5).with_seed(7);
//! let fit = cp_als_fit(&tensor, 3, &config).unwrap();
//! assert!(fit.converged());
//!
//! let fms = factor_match_score(&truth, &fit.model, &FmsOptions::default()).unwrap();
//! assert!(fms.score > 0.99);
//! ```
//!
//! ## Components
//!
//! - [`core`]: dense tensors, unfold/fold, seeded random creation
//! - [`kernels`]: Khatri-Rao, MTTKRP, Gram accumulators, n-mode products
//! - [`decomp`]: Kruskal models, initializers, the ALS optimizer and checkpoints
//! - [`metrics`]: factor match score, core consistency, completion score
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Features
//!
//! - `parallel` (default): restarts run concurrently and large Khatri-Rao
//!   products are built column-parallel

#![deny(warnings)]

pub use parafit_core as core;
pub use parafit_decomp as decomp;
pub use parafit_kernels as kernels;
pub use parafit_metrics as metrics;

pub mod logging;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```
    //! use parafit::prelude::*;
    //!
    //! let tensor = DenseND::<f64>::zeros(&[4, 5, 6]);
    //! assert_eq!(tensor.rank(), 3);
    //! ```

    pub use crate::core::DenseND;

    pub use crate::decomp::{
        cp_als_fit, cp_als_fit_with, CpAls, CpFit, FitConfig, FitError, FitTrace, FitWarning,
        InitMethod, Initializer, KruskalCheckpoint, KruskalTensor, PrecomputedInit,
        RandomDistribution, RandomInit, SvdInit, Termination,
    };

    pub use crate::kernels::{cp_reconstruct, gram_hadamard, khatri_rao, khatri_rao_skip, mttkrp};

    pub use crate::metrics::{
        core_consistency, factor_match_score, tensor_completion_score, FmsOptions, FmsReduction,
        FmsResult, ScoreError, SignHandling,
    };

    pub use crate::logging::{init_logging, LogFormat, LoggingConfig};
}
