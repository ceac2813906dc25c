//! Single-run CP-ALS optimizer
//!
//! One run moves through
//!
//! ```text
//! Uninitialized ─initialize()→ Initialized ─run()→ Iterating ─→ Finished(Termination)
//! ```
//!
//! Each sweep updates every mode in turn. For mode n, with M the mode-n
//! MTTKRP and V the Hadamard product of the other modes' Gram matrices,
//!
//! A_n ← M · (V + λI)⁻¹
//!
//! where λ = 0 unless V is ill-conditioned. Modes listed as non-negative in
//! [`FitConfig::non_negative_modes`] solve the same system under `A_n ≥ 0`.
//! Mode updates inside a sweep are strictly sequential; parallelism only
//! happens across restarts.

use crate::config::FitConfig;
use crate::error::{FitError, FitResult};
use crate::init::Initializer;
use crate::kruskal::{column_norm, KruskalTensor};
use crate::scalar::FitScalar;
use crate::solve::solve_mode;
use parafit_core::DenseND;
use parafit_kernels::{gram_hadamard, mttkrp};
use scirs2_core::ndarray_ext::Axis;
use scirs2_core::random::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Loss change fell below the tolerance, or loss reached the absolute floor
    Converged,
    /// Loss kept increasing for longer than the patience allows
    Stalled,
    MaxIterReached,
    BudgetExhausted,
    /// Loss became NaN or infinite
    Diverged,
}

/// Lifecycle of a [`CpAls`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlsState {
    Uninitialized,
    Initialized,
    Iterating,
    Finished(Termination),
}

impl AlsState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlsState::Finished(_))
    }
}

/// Non-fatal conditions observed during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitWarning {
    /// Iteration limit reached before the tolerance was met
    MaxIterationsReached { iterations: usize },
    /// Loss increased `streak` sweeps in a row
    LossIncreased { streak: usize },
    /// Ridge regularization was needed for the Gram matrix of `mode`
    RidgeEngaged {
        mode: usize,
        iteration: usize,
        condition: f64,
    },
    /// The wall-clock budget ran out
    BudgetExhausted { iterations: usize },
}

impl fmt::Display for FitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitWarning::MaxIterationsReached { iterations } => write!(
                f,
                "maximum of {} iterations reached without meeting the tolerance",
                iterations
            ),
            FitWarning::LossIncreased { streak } => {
                write!(f, "loss increased for {} consecutive sweeps", streak)
            }
            FitWarning::RidgeEngaged {
                mode,
                iteration,
                condition,
            } => write!(
                f,
                "ridge engaged for mode {} at iteration {} (condition number {:.3e})",
                mode, iteration, condition
            ),
            FitWarning::BudgetExhausted { iterations } => {
                write!(f, "time budget exhausted after {} iterations", iterations)
            }
        }
    }
}

/// Diagnostics of one ALS run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitTrace {
    /// Full sweeps performed
    pub iterations: usize,
    /// Relative reconstruction error after each sweep
    pub losses: Vec<f64>,
    /// True only when the tolerance (relative or absolute) was met
    pub converged: bool,
    pub termination: Termination,
    pub warnings: Vec<FitWarning>,
    /// Mode updates that needed the ridge term
    pub ridge_activations: usize,
    /// Seed of the generator the run was initialised from, when known
    pub seed: Option<u64>,
    /// Name of the initializer
    pub init: String,
    pub elapsed: Duration,
}

impl FitTrace {
    /// Loss of the returned model, which is the lowest loss observed
    pub fn final_loss(&self) -> f64 {
        self.losses.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Loss after the last sweep
    pub fn last_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Check that `rank` can be fitted to `tensor`; returns `‖tensor‖`
pub(crate) fn validate_problem<T: FitScalar>(tensor: &DenseND<T>, rank: usize) -> FitResult<T> {
    let shape = tensor.shape();
    if shape.len() < 2 {
        return Err(FitError::ShapeMismatch(format!(
            "CP fitting needs at least 2 modes, tensor has shape {:?}",
            shape
        )));
    }
    if shape.iter().any(|&d| d == 0) {
        return Err(FitError::ShapeMismatch(format!(
            "tensor shape {:?} has an empty mode",
            shape
        )));
    }
    if rank == 0 {
        return Err(FitError::Rank("rank must be positive".into()));
    }
    if let Some((mode, &dim)) = shape.iter().enumerate().find(|&(_, &d)| rank > d) {
        return Err(FitError::ShapeMismatch(format!(
            "rank {} exceeds mode-{} dimension {}",
            rank, mode, dim
        )));
    }
    if !tensor.is_finite() {
        return Err(FitError::NumericalInstability(
            "tensor contains NaN or infinite entries".into(),
        ));
    }
    let norm = tensor.frobenius_norm();
    if norm == T::zero() {
        return Err(FitError::Rank(
            "tensor is identically zero; no positive-rank model is identifiable".into(),
        ));
    }
    Ok(norm)
}

/// Alternating least squares for one start
///
/// # Examples
///
/// ```
/// use parafit_core::DenseND;
/// use parafit_decomp::{CpAls, FitConfig, KruskalTensor, RandomInit};
/// use scirs2_core::random::{rngs::StdRng, SeedableRng};
///
/// let truth = KruskalTensor::<f64>::random_init(&[6, 7, 8], 2, 1).unwrap();
/// let tensor = truth.construct_tensor().unwrap();
///
/// let config = FitConfig::default().with_max_iterations(500);
/// let mut als = CpAls::new(&tensor, 2, &config).unwrap();
/// als.initialize(&RandomInit::default(), &mut StdRng::seed_from_u64(5)).unwrap();
/// let (model, trace) = als.run().unwrap();
///
/// assert!(als.state().is_terminal());
/// assert_eq!(model.rank(), 2);
/// assert!(trace.final_loss() < 0.5);
/// ```
pub struct CpAls<'a, T: FitScalar> {
    tensor: &'a DenseND<T>,
    tensor_norm: T,
    rank: usize,
    config: FitConfig,
    state: AlsState,
    model: Option<KruskalTensor<T>>,
    init_name: &'static str,
    seed: Option<u64>,
    warnings: Vec<FitWarning>,
    ridge_activations: usize,
    ridge_reported: Vec<bool>,
}

impl<'a, T: FitScalar> CpAls<'a, T> {
    /// Validate the problem and configuration
    ///
    /// # Errors
    ///
    /// Configuration errors as in [`FitConfig::validate`]; shape and rank
    /// errors as in [`cp_als_fit`](crate::cp_als_fit).
    pub fn new(tensor: &'a DenseND<T>, rank: usize, config: &FitConfig) -> FitResult<Self> {
        config.validate()?;
        let tensor_norm = validate_problem(tensor, rank)?;
        let constrained = config.non_negative_modes.len();
        if constrained != 0 && constrained != tensor.rank() {
            return Err(FitError::InvalidConfig(format!(
                "non_negative_modes has {} entries for a {}-way tensor",
                constrained,
                tensor.rank()
            )));
        }
        Ok(Self {
            tensor,
            tensor_norm,
            rank,
            config: config.clone(),
            state: AlsState::Uninitialized,
            model: None,
            init_name: "none",
            seed: None,
            warnings: Vec::new(),
            ridge_activations: 0,
            ridge_reported: vec![false; tensor.rank()],
        })
    }

    /// Record the seed the initializer's generator was created from
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn state(&self) -> AlsState {
        self.state
    }

    /// Current iterate (the starting model before `run`)
    pub fn model(&self) -> Option<&KruskalTensor<T>> {
        self.model.as_ref()
    }

    /// Draw the starting model
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidConfig`] once the run has started, and any
    /// error of the initializer. A starting model whose rank or shape does
    /// not match the problem is rejected.
    pub fn initialize(&mut self, init: &dyn Initializer<T>, rng: &mut StdRng) -> FitResult<()> {
        if !matches!(self.state, AlsState::Uninitialized | AlsState::Initialized) {
            return Err(FitError::InvalidConfig(format!(
                "cannot initialise an optimizer in state {:?}",
                self.state
            )));
        }
        let mut model = init.initialize(self.tensor, self.rank, rng)?;
        if model.rank() != self.rank {
            return Err(FitError::Rank(format!(
                "initializer '{}' produced rank {}, expected {}",
                init.name(),
                model.rank(),
                self.rank
            )));
        }
        if model.shape().as_slice() != self.tensor.shape() {
            return Err(FitError::ShapeMismatch(format!(
                "initializer '{}' produced shape {:?}, tensor has {:?}",
                init.name(),
                model.shape(),
                self.tensor.shape()
            )));
        }

        for mode in 0..model.n_modes() {
            if self.config.is_non_negative(mode) {
                let magnitude = model.factors()[mode].mapv(|x| x.abs());
                model.set_factor(mode, magnitude)?;
            }
        }

        if self.config.normalize_factors {
            model.normalize();
        } else {
            absorb_weights(&mut model)?;
        }

        self.model = Some(model);
        self.init_name = init.name();
        self.state = AlsState::Initialized;
        Ok(())
    }

    /// Iterate until a termination condition holds
    ///
    /// Returns the lowest-loss model observed with its trace. The state is
    /// terminal afterwards, also when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`FitError::Divergence`] if the loss becomes NaN or infinite
    /// - [`FitError::NumericalInstability`] if a Gram matrix cannot be
    ///   inverted even with the ridge term
    /// - [`FitError::InvalidConfig`] if called before `initialize` or twice
    #[tracing::instrument(skip_all, fields(rank = self.rank, init = self.init_name, seed = ?self.seed))]
    pub fn run(&mut self) -> FitResult<(KruskalTensor<T>, FitTrace)> {
        if self.state != AlsState::Initialized {
            return Err(FitError::InvalidConfig(format!(
                "run() requires an initialised optimizer, state is {:?}",
                self.state
            )));
        }
        self.state = AlsState::Iterating;
        match self.iterate() {
            Ok(result) => Ok(result),
            Err(err) => {
                self.state = AlsState::Finished(Termination::Diverged);
                tracing::warn!(error = %err, "ALS run abandoned");
                Err(err)
            }
        }
    }

    fn iterate(&mut self) -> FitResult<(KruskalTensor<T>, FitTrace)> {
        let start = Instant::now();
        let n_modes = self.tensor.rank();
        let mut losses: Vec<f64> = Vec::new();
        let mut best: Option<(KruskalTensor<T>, f64)> = None;
        let mut increase_streak = 0usize;
        let mut termination = Termination::MaxIterReached;
        let mut iterations = 0;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            for mode in 0..n_modes {
                self.update_mode(mode, iteration)?;
            }

            let loss = self.current_loss()?;
            losses.push(loss);
            if !loss.is_finite() {
                return Err(FitError::Divergence { iteration, loss });
            }

            if best.as_ref().map_or(true, |(_, b)| loss < *b) {
                if let Some(model) = &self.model {
                    best = Some((model.clone(), loss));
                }
            }

            let previous = losses.len().checked_sub(2).map(|i| losses[i]);
            let relative_change = previous.map(|p| if p > 0.0 { (p - loss).abs() / p } else { 0.0 });
            tracing::debug!(iteration, loss, relative_change = ?relative_change, "ALS sweep");

            if loss <= self.config.absolute_tolerance
                || relative_change.is_some_and(|c| c < self.config.tolerance)
            {
                termination = Termination::Converged;
                break;
            }

            if let Some(p) = previous {
                if loss > p {
                    increase_streak += 1;
                    if increase_streak > self.config.patience {
                        tracing::warn!(iteration, streak = increase_streak, "loss keeps increasing");
                        self.warnings.push(FitWarning::LossIncreased {
                            streak: increase_streak,
                        });
                        termination = Termination::Stalled;
                        break;
                    }
                } else {
                    increase_streak = 0;
                }
            }

            if let Some(budget) = self.config.time_budget {
                if start.elapsed() >= budget {
                    tracing::warn!(iteration, ?budget, "time budget exhausted");
                    self.warnings
                        .push(FitWarning::BudgetExhausted { iterations: iteration });
                    termination = Termination::BudgetExhausted;
                    break;
                }
            }
        }

        if termination == Termination::MaxIterReached {
            tracing::warn!(iterations, "maximum iterations reached without convergence");
            self.warnings
                .push(FitWarning::MaxIterationsReached { iterations });
        }

        let (mut model, best_loss) = best.ok_or_else(|| {
            FitError::InvalidConfig("no ALS sweep was performed".into())
        })?;
        if !self.config.normalize_factors {
            model.normalize();
        }

        self.state = AlsState::Finished(termination);
        tracing::debug!(iterations, best_loss, ?termination, "ALS run finished");

        let trace = FitTrace {
            iterations,
            losses,
            converged: termination == Termination::Converged,
            termination,
            warnings: std::mem::take(&mut self.warnings),
            ridge_activations: self.ridge_activations,
            seed: self.seed,
            init: self.init_name.to_string(),
            elapsed: start.elapsed(),
        };
        Ok((model, trace))
    }

    fn update_mode(&mut self, mode: usize, iteration: usize) -> FitResult<()> {
        let (m, v) = {
            let model = self.model.as_ref().ok_or_else(|| {
                FitError::InvalidConfig("optimizer has no model".into())
            })?;
            let views: Vec<_> = model.factors().iter().map(|f| f.view()).collect();
            (
                mttkrp(self.tensor, &views, mode)?,
                gram_hadamard(&views, Some(mode))?,
            )
        };

        let non_negative = self.config.is_non_negative(mode);
        let solution = solve_mode(&m, &v, &self.config, non_negative)?;
        if let Some(condition) = solution.ridge {
            self.record_ridge(mode, iteration, condition);
        }

        let mut updated = solution.factor;
        let normalize = self.config.normalize_factors;
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| FitError::InvalidConfig("optimizer has no model".into()))?;

        if normalize {
            let weights = model.weights_mut();
            for (r, mut column) in updated.axis_iter_mut(Axis(1)).enumerate() {
                let norm = column_norm(column.view());
                if norm > T::zero() && norm.is_finite() {
                    column.mapv_inplace(|x| x / norm);
                    weights[r] = norm;
                } else {
                    weights[r] = if norm.is_finite() { T::zero() } else { norm };
                }
            }
        }
        model.set_factor(mode, updated)
    }

    fn record_ridge(&mut self, mode: usize, iteration: usize, condition: f64) {
        self.ridge_activations += 1;
        if self.ridge_reported[mode] {
            tracing::debug!(mode, iteration, condition, "ridge engaged");
            return;
        }
        self.ridge_reported[mode] = true;
        tracing::warn!(mode, iteration, condition, "ill-conditioned Gram matrix, ridge engaged");
        self.warnings.push(FitWarning::RidgeEngaged {
            mode,
            iteration,
            condition,
        });
    }

    fn current_loss(&self) -> FitResult<f64> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| FitError::InvalidConfig("optimizer has no model".into()))?;
        let estimate = model.construct_tensor()?;
        let residual = estimate
            .distance(self.tensor)
            .map_err(|e| FitError::ShapeMismatch(e.to_string()))?;
        Ok((residual / self.tensor_norm).to_f64_lossy())
    }
}

/// Move the weights into the first factor so that all weights are one
fn absorb_weights<T: FitScalar>(model: &mut KruskalTensor<T>) -> FitResult<()> {
    let weights = model.weights().clone();
    if weights.iter().all(|&w| w == T::one()) {
        return Ok(());
    }
    let mut first = model.factors()[0].clone();
    for (mut column, &w) in first.axis_iter_mut(Axis(1)).zip(weights.iter()) {
        column.mapv_inplace(|x| x * w);
    }
    model.set_factor(0, first)?;
    model.weights_mut().fill(T::one());
    Ok(())
}
