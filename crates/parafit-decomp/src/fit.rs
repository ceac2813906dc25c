//! Multi-restart CP-ALS
//!
//! Restart seeds are drawn from a master generator seeded with
//! `FitConfig::seed`, so the whole fit is a pure function of the tensor, the
//! rank and the configuration. With the `parallel` feature the restarts run
//! concurrently; results are collected in restart order either way, which
//! keeps the selection deterministic.

use crate::als::{CpAls, FitTrace, Termination};
use crate::config::{FitConfig, InitMethod};
use crate::error::{FitError, FitResult};
use crate::init::{Initializer, RandomInit, SvdInit};
use crate::kruskal::KruskalTensor;
use crate::scalar::FitScalar;
use parafit_core::DenseND;
use scirs2_core::random::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

/// Outcome of one restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartSummary {
    pub restart: usize,
    pub seed: u64,
    pub init: String,
    /// `None` when the restart failed
    pub termination: Option<Termination>,
    pub iterations: usize,
    pub final_loss: Option<f64>,
    /// Error message of a failed restart
    pub error: Option<String>,
}

impl RestartSummary {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Best model over all restarts
#[derive(Debug, Clone)]
pub struct CpFit<T> {
    pub model: KruskalTensor<T>,
    /// Trace of the selected restart
    pub trace: FitTrace,
    pub best_restart: usize,
    /// One entry per restart, in restart order
    pub restarts: Vec<RestartSummary>,
}

impl<T> CpFit<T> {
    pub fn final_loss(&self) -> f64 {
        self.trace.final_loss()
    }

    pub fn converged(&self) -> bool {
        self.trace.converged
    }

    pub fn into_model(self) -> KruskalTensor<T> {
        self.model
    }
}

/// Which initializer each restart uses
enum Starts<'a, T: FitScalar> {
    Configured { random: RandomInit, svd_first: bool },
    Custom(&'a dyn Initializer<T>),
}

impl<'a, T: FitScalar> Starts<'a, T> {
    fn for_restart(&self, restart: usize) -> &dyn Initializer<T> {
        match self {
            Starts::Configured { random, svd_first } => {
                if *svd_first && restart == 0 {
                    &SvdInit
                } else {
                    random
                }
            }
            Starts::Custom(init) => *init,
        }
    }
}

/// Fit a rank-`rank` CP model by ALS with `config.n_restarts` restarts
///
/// Restart 0 starts from the SVD when `config.init_strategy` is
/// [`InitMethod::Svd`]; every other restart starts from random factors drawn
/// with `config.random_distribution`. The restart with the lowest final loss
/// wins, ties going to the lower index.
///
/// # Errors
///
/// - [`FitError::InvalidConfig`] for an invalid configuration
/// - [`FitError::ShapeMismatch`] for fewer than 2 modes, an empty mode, or a
///   rank larger than some mode dimension
/// - [`FitError::Rank`] for rank 0 or an identically zero tensor
/// - [`FitError::AllRestartsDiverged`] when no restart produced a model
///
/// # Examples
///
/// ```
/// use parafit_decomp::{cp_als_fit, FitConfig, KruskalTensor};
///
/// let truth = KruskalTensor::<f64>::random_init(&[6, 7, 8], 2, 3).unwrap();
/// let tensor = truth.construct_tensor().unwrap();
///
/// let config = FitConfig::default().with_n_restarts(3).with_seed(11);
/// let fit = cp_als_fit(&tensor, 2, &config).unwrap();
///
/// assert_eq!(fit.restarts.len(), 3);
/// assert!(fit.final_loss() < 0.1);
/// ```
#[tracing::instrument(skip_all, fields(rank = rank, shape = ?tensor.shape(), restarts = config.n_restarts))]
pub fn cp_als_fit<T: FitScalar>(
    tensor: &DenseND<T>,
    rank: usize,
    config: &FitConfig,
) -> FitResult<CpFit<T>> {
    let starts = Starts::Configured {
        random: RandomInit::new(config.random_distribution),
        svd_first: config.init_strategy == InitMethod::Svd,
    };
    fit_restarts(tensor, rank, config, &starts)
}

/// Like [`cp_als_fit`], with every restart starting from `initializer`
///
/// Each restart still gets its own seeded generator.
#[tracing::instrument(skip_all, fields(rank = rank, init = initializer.name(), restarts = config.n_restarts))]
pub fn cp_als_fit_with<T: FitScalar>(
    tensor: &DenseND<T>,
    rank: usize,
    config: &FitConfig,
    initializer: &dyn Initializer<T>,
) -> FitResult<CpFit<T>> {
    fit_restarts(tensor, rank, config, &Starts::Custom(initializer))
}

type RestartOutcome<T> = (usize, u64, FitResult<(KruskalTensor<T>, FitTrace)>);

fn fit_restarts<T: FitScalar>(
    tensor: &DenseND<T>,
    rank: usize,
    config: &FitConfig,
    starts: &Starts<'_, T>,
) -> FitResult<CpFit<T>> {
    config.validate()?;
    crate::als::validate_problem(tensor, rank)?;

    let mut master = StdRng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_restarts)
        .map(|_| master.random::<u64>())
        .collect();

    let run = |(restart, &seed): (usize, &u64)| -> RestartOutcome<T> {
        let init = starts.for_restart(restart);
        (restart, seed, run_restart(tensor, rank, config, init, seed))
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<RestartOutcome<T>> = seeds.par_iter().enumerate().map(run).collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<RestartOutcome<T>> = seeds.iter().enumerate().map(run).collect();

    let mut summaries = Vec::with_capacity(outcomes.len());
    let mut best: Option<(usize, KruskalTensor<T>, FitTrace)> = None;
    let mut last_error: Option<String> = None;

    for (restart, seed, outcome) in outcomes {
        let init = starts.for_restart(restart).name().to_string();
        match outcome {
            Ok((model, trace)) => {
                tracing::debug!(
                    restart,
                    seed,
                    loss = trace.final_loss(),
                    iterations = trace.iterations,
                    termination = ?trace.termination,
                    "restart finished"
                );
                summaries.push(RestartSummary {
                    restart,
                    seed,
                    init,
                    termination: Some(trace.termination),
                    iterations: trace.iterations,
                    final_loss: Some(trace.final_loss()),
                    error: None,
                });
                let better = best
                    .as_ref()
                    .map_or(true, |(_, _, b)| trace.final_loss() < b.final_loss());
                if better {
                    best = Some((restart, model, trace));
                }
            }
            Err(err) if err.is_recoverable_by_restart() => {
                tracing::warn!(restart, seed, error = %err, "restart failed");
                let message = err.to_string();
                summaries.push(RestartSummary {
                    restart,
                    seed,
                    init,
                    termination: None,
                    iterations: 0,
                    final_loss: None,
                    error: Some(message.clone()),
                });
                last_error = Some(message);
            }
            Err(err) => return Err(err),
        }
    }

    let (best_restart, model, trace) = best.ok_or_else(|| FitError::AllRestartsDiverged {
        restarts: config.n_restarts,
        last_error: last_error.unwrap_or_default(),
    })?;

    tracing::info!(
        best_restart,
        loss = trace.final_loss(),
        converged = trace.converged,
        failed = summaries.iter().filter(|s| !s.succeeded()).count(),
        "selected best restart"
    );

    Ok(CpFit {
        model,
        trace,
        best_restart,
        restarts: summaries,
    })
}

fn run_restart<T: FitScalar>(
    tensor: &DenseND<T>,
    rank: usize,
    config: &FitConfig,
    init: &dyn Initializer<T>,
    seed: u64,
) -> FitResult<(KruskalTensor<T>, FitTrace)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut als = CpAls::new(tensor, rank, config)?.with_seed(seed);
    als.initialize(init, &mut rng)?;
    als.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Produces a non-finite model so that every run diverges
    struct PoisonInit;

    impl Initializer<f64> for PoisonInit {
        fn initialize(
            &self,
            tensor: &DenseND<f64>,
            rank: usize,
            _rng: &mut StdRng,
        ) -> FitResult<KruskalTensor<f64>> {
            let factors = tensor
                .shape()
                .iter()
                .map(|&d| scirs2_core::ndarray_ext::Array2::from_elem((d, rank), f64::NAN))
                .collect();
            KruskalTensor::with_unit_weights(factors)
        }

        fn name(&self) -> &'static str {
            "poison"
        }
    }

    /// Rejects every request with a non-recoverable error
    struct RefusingInit;

    impl Initializer<f64> for RefusingInit {
        fn initialize(
            &self,
            _tensor: &DenseND<f64>,
            _rank: usize,
            _rng: &mut StdRng,
        ) -> FitResult<KruskalTensor<f64>> {
            Err(FitError::InvalidConfig("refused".into()))
        }

        fn name(&self) -> &'static str {
            "refusing"
        }
    }

    fn exact_tensor() -> DenseND<f64> {
        KruskalTensor::<f64>::random_init(&[5, 6, 4], 2, 21)
            .unwrap()
            .construct_tensor()
            .unwrap()
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let tensor = exact_tensor();
        let config = FitConfig::default().with_n_restarts(3).with_seed(5);
        let a = cp_als_fit(&tensor, 2, &config).unwrap();
        let b = cp_als_fit(&tensor, 2, &config).unwrap();
        assert_eq!(a.best_restart, b.best_restart);
        assert_eq!(a.model, b.model);
        assert_eq!(a.restarts, b.restarts);
    }

    #[test]
    fn test_best_restart_has_minimum_loss() {
        let tensor = exact_tensor();
        let config = FitConfig::default().with_n_restarts(4).with_seed(9);
        let fit = cp_als_fit(&tensor, 2, &config).unwrap();
        let min = fit
            .restarts
            .iter()
            .filter_map(|r| r.final_loss)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(fit.restarts[fit.best_restart].final_loss, Some(min));
        assert_eq!(fit.final_loss(), min);
        // Ties resolve to the first restart reaching the minimum
        let first = fit
            .restarts
            .iter()
            .position(|r| r.final_loss == Some(min))
            .unwrap();
        assert_eq!(fit.best_restart, first);
    }

    #[test]
    fn test_svd_first_restart_only() {
        let tensor = exact_tensor();
        let config = FitConfig::default()
            .with_n_restarts(3)
            .with_init_strategy(InitMethod::Svd);
        let fit = cp_als_fit(&tensor, 2, &config).unwrap();
        assert_eq!(fit.restarts[0].init, "svd");
        assert!(fit.restarts[1..].iter().all(|r| r.init == "random_normal"));
    }

    #[test]
    fn test_all_restarts_diverged() {
        let tensor = exact_tensor();
        let config = FitConfig::default().with_n_restarts(3);
        let err = cp_als_fit_with(&tensor, 2, &config, &PoisonInit).unwrap_err();
        match err {
            FitError::AllRestartsDiverged {
                restarts,
                last_error,
            } => {
                assert_eq!(restarts, 3);
                assert!(!last_error.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_recoverable_error_propagates() {
        let tensor = exact_tensor();
        let config = FitConfig::default().with_n_restarts(2);
        assert!(matches!(
            cp_als_fit_with(&tensor, 2, &config, &RefusingInit),
            Err(FitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_problem_rejected_before_restarts() {
        let tensor = exact_tensor();
        let config = FitConfig::default();
        assert!(matches!(
            cp_als_fit(&tensor, 0, &config),
            Err(FitError::Rank(_))
        ));
        assert!(matches!(
            cp_als_fit(&tensor, 7, &config),
            Err(FitError::ShapeMismatch(_))
        ));
        assert!(matches!(
            cp_als_fit(&tensor, 2, &FitConfig::default().with_n_restarts(0)),
            Err(FitError::InvalidConfig(_))
        ));
    }
}
