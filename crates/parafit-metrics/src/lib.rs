//! # parafit-metrics
//!
//! Quality measures for fitted Kruskal models.
//!
//! - [`factor_match_score`]: agreement between two models up to component
//!   permutation, scaling and sign, with the pairing found by the Hungarian
//!   algorithm ([`max_score_assignment`])
//! - [`core_consistency`]: CORCONDIA rank diagnostic
//! - [`tensor_completion_score`]: error on held-out entries
//!
//! ## Quick Start
//!
//! ```
//! use parafit_decomp::{cp_als_fit, FitConfig, KruskalTensor};
//! use parafit_metrics::{factor_match_score, FmsOptions};
//!
//! let truth = KruskalTensor::<f64>::random_init(&[6, 7, 8], 2, 4).unwrap();
//! let tensor = truth.construct_tensor().unwrap();
//! let fit = cp_als_fit(&tensor, 2, &FitConfig::default().with_n_restarts(3)).unwrap();
//!
//! let fms = factor_match_score(&truth, &fit.model, &FmsOptions::default()).unwrap();
//! println!("FMS {:.4}, permutation {:?}", fms.score, fms.permutation);
//! assert!(fms.score > 0.9);
//! ```

#![deny(warnings)]

pub mod assignment;
pub mod completion;
pub mod core_consistency;
pub mod error;
pub mod fms;


pub use assignment::{max_score_assignment, min_cost_assignment, Assignment};
pub use completion::{model_completion_score, tensor_completion_score};
pub use core_consistency::core_consistency;
pub use error::{ScoreError, ScoreResult};
pub use fms::{factor_match_score, FmsOptions, FmsReduction, FmsResult, SignHandling};
