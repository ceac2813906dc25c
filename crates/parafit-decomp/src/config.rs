//! Optimizer configuration

use crate::error::{FitError, FitResult};
use crate::kruskal::RandomDistribution;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How the starting factors of each restart are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    #[default]
    Random,
    /// Leading left singular vectors of each unfolding. Only the first
    /// restart uses it; later restarts start from random factors.
    Svd,
}

/// Configuration recognised by the ALS optimizer and the restart driver
///
/// # Examples
///
/// ```
/// use parafit_decomp::{FitConfig, InitMethod};
///
/// let config = FitConfig::default()
///     .with_max_iterations(200)
///     .with_n_restarts(4)
///     .with_init_strategy(InitMethod::Svd)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
///
/// let json = config.to_json_string().unwrap();
/// let back = FitConfig::from_json_str(&json).unwrap();
/// assert_eq!(back, config);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Upper bound on full ALS sweeps per restart
    pub max_iterations: usize,
    /// Relative loss change below which a run has converged
    pub tolerance: f64,
    /// Loss at or below which a run has converged outright
    pub absolute_tolerance: f64,
    pub n_restarts: usize,
    /// Ridge scale added to the Gram matrix when it is ill-conditioned
    pub ridge: f64,
    /// Gram condition number above which the ridge engages
    pub max_condition: f64,
    pub init_strategy: InitMethod,
    pub random_distribution: RandomDistribution,
    /// Seed of the master generator that hands out restart seeds
    pub seed: u64,
    /// Consecutive loss increases tolerated before a run stops
    pub patience: usize,
    /// Keep factor columns at unit norm, with the scale held in the weights
    pub normalize_factors: bool,
    /// Wall-clock budget per restart
    pub time_budget: Option<Duration>,
    /// Per-mode non-negativity; empty leaves every mode unconstrained,
    /// otherwise there is one entry per tensor mode
    pub non_negative_modes: Vec<bool>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
            absolute_tolerance: 1e-12,
            n_restarts: 1,
            ridge: 1e-9,
            max_condition: 1e12,
            init_strategy: InitMethod::Random,
            random_distribution: RandomDistribution::Normal,
            seed: 0,
            patience: 5,
            normalize_factors: true,
            time_budget: None,
            non_negative_modes: Vec::new(),
        }
    }
}

impl FitConfig {
    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidConfig`] for zero iterations or restarts,
    /// negative or NaN tolerances or ridge, and a condition limit not above 1.
    pub fn validate(&self) -> FitResult<()> {
        if self.max_iterations == 0 {
            return Err(FitError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.n_restarts == 0 {
            return Err(FitError::InvalidConfig(
                "n_restarts must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("tolerance", self.tolerance),
            ("absolute_tolerance", self.absolute_tolerance),
            ("ridge", self.ridge),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FitError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.max_condition.is_nan() || self.max_condition <= 1.0 {
            return Err(FitError::InvalidConfig(format!(
                "max_condition must exceed 1, got {}",
                self.max_condition
            )));
        }
        Ok(())
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_absolute_tolerance(mut self, absolute_tolerance: f64) -> Self {
        self.absolute_tolerance = absolute_tolerance;
        self
    }

    pub fn with_n_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    pub fn with_max_condition(mut self, max_condition: f64) -> Self {
        self.max_condition = max_condition;
        self
    }

    pub fn with_init_strategy(mut self, init_strategy: InitMethod) -> Self {
        self.init_strategy = init_strategy;
        self
    }

    pub fn with_random_distribution(mut self, distribution: RandomDistribution) -> Self {
        self.random_distribution = distribution;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_normalize_factors(mut self, normalize_factors: bool) -> Self {
        self.normalize_factors = normalize_factors;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_non_negative_modes(mut self, modes: Vec<bool>) -> Self {
        self.non_negative_modes = modes;
        self
    }

    /// Whether updates of `mode` are constrained to non-negative entries
    pub fn is_non_negative(&self, mode: usize) -> bool {
        self.non_negative_modes.get(mode).copied().unwrap_or(false)
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> FitResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FitError::InvalidConfig(format!("malformed JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> FitResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> FitResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FitError::InvalidConfig(format!("cannot serialise: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.n_restarts, 1);
        assert_eq!(config.init_strategy, InitMethod::Random);
        assert!(config.normalize_factors);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            FitConfig::default().with_max_iterations(0),
            FitConfig::default().with_n_restarts(0),
            FitConfig::default().with_tolerance(-1.0),
            FitConfig::default().with_tolerance(f64::NAN),
            FitConfig::default().with_ridge(f64::INFINITY),
            FitConfig::default().with_max_condition(1.0),
            FitConfig::default().with_max_condition(f64::NAN),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(FitError::InvalidConfig(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            FitConfig::from_json_str(r#"{ "n_restarts": 8, "init_strategy": "svd", "seed": 3 }"#)
                .unwrap();
        assert_eq!(config.n_restarts, 8);
        assert_eq!(config.init_strategy, InitMethod::Svd);
        assert_eq!(config.seed, 3);
        assert_eq!(config.max_iterations, 1000);
        assert!(config.non_negative_modes.is_empty());
        assert!(!config.is_non_negative(0));
    }

    #[test]
    fn test_non_negative_modes_from_json() {
        let config =
            FitConfig::from_json_str(r#"{ "non_negative_modes": [false, true, true] }"#).unwrap();
        assert!(!config.is_non_negative(0));
        assert!(config.is_non_negative(2));
        assert!(!config.is_non_negative(7));
    }

    #[test]
    fn test_json_rejects_invalid() {
        assert!(matches!(
            FitConfig::from_json_str(r#"{ "max_iterations": 0 }"#),
            Err(FitError::InvalidConfig(_))
        ));
        assert!(matches!(
            FitConfig::from_json_str("not json"),
            Err(FitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let config = FitConfig::default()
            .with_time_budget(Duration::from_millis(250))
            .with_random_distribution(RandomDistribution::Uniform);
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();
        assert_eq!(FitConfig::from_json_file(&path).unwrap(), config);
        assert!(matches!(
            FitConfig::from_json_file(dir.path().join("missing.json")),
            Err(FitError::Io(_))
        ));
    }
}
