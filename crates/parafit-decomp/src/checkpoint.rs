//! Persisted Kruskal models
//!
//! A checkpoint stores the rank, every mode dimension, the weights and the
//! factor matrices, which is enough to rebuild the model exactly without the
//! tensor it was fitted to. Values are stored as `f64` whatever the element
//! type of the model.
//!
//! Two encodings are provided: self-describing JSON for inspection and
//! interchange, and compact `bincode` bytes.

use crate::error::{FitError, FitResult};
use crate::kruskal::KruskalTensor;
use crate::scalar::FitScalar;
use scirs2_core::ndarray_ext::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tag written into every checkpoint
pub const CHECKPOINT_FORMAT: &str = "parafit.kruskal";

/// Current layout version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a [`KruskalTensor`]
///
/// # Examples
///
/// ```
/// use parafit_decomp::{KruskalCheckpoint, KruskalTensor};
///
/// let model = KruskalTensor::<f64>::random_init(&[3, 4, 5], 2, 42).unwrap();
/// let json = KruskalCheckpoint::from_model(&model).to_json_string().unwrap();
///
/// let restored: KruskalTensor<f64> = KruskalCheckpoint::from_json_str(&json)
///     .unwrap()
///     .into_model()
///     .unwrap();
/// assert_eq!(restored, model);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KruskalCheckpoint {
    pub format: String,
    pub version: u32,
    pub rank: usize,
    pub n_modes: usize,
    pub dims: Vec<usize>,
    pub weights: Vec<f64>,
    /// One row-major `dims[n] × rank` matrix per mode
    pub factors: Vec<Vec<f64>>,
    /// Iteration the model was taken at, if it came from a fit
    pub iteration: Option<usize>,
    pub loss: Option<f64>,
}

impl KruskalCheckpoint {
    pub fn from_model<T: FitScalar>(model: &KruskalTensor<T>) -> Self {
        Self {
            format: CHECKPOINT_FORMAT.to_string(),
            version: CHECKPOINT_VERSION,
            rank: model.rank(),
            n_modes: model.n_modes(),
            dims: model.shape(),
            weights: model.weights().iter().map(|w| w.to_f64_lossy()).collect(),
            factors: model
                .factors()
                .iter()
                .map(|f| f.iter().map(|x| x.to_f64_lossy()).collect())
                .collect(),
            iteration: None,
            loss: None,
        }
    }

    /// Attach fit progress to the snapshot
    pub fn with_progress(mut self, iteration: usize, loss: f64) -> Self {
        self.iteration = Some(iteration);
        self.loss = Some(loss);
        self
    }

    /// Check the header and every recorded size
    pub fn validate(&self) -> FitResult<()> {
        if self.format != CHECKPOINT_FORMAT {
            return Err(FitError::Checkpoint(format!(
                "unknown format '{}', expected '{}'",
                self.format, CHECKPOINT_FORMAT
            )));
        }
        if self.version != CHECKPOINT_VERSION {
            return Err(FitError::Checkpoint(format!(
                "unsupported version {}, expected {}",
                self.version, CHECKPOINT_VERSION
            )));
        }
        if self.dims.len() != self.n_modes || self.factors.len() != self.n_modes {
            return Err(FitError::ShapeMismatch(format!(
                "checkpoint declares {} modes but stores {} dimensions and {} factors",
                self.n_modes,
                self.dims.len(),
                self.factors.len()
            )));
        }
        if self.weights.len() != self.rank {
            return Err(FitError::ShapeMismatch(format!(
                "checkpoint declares rank {} but stores {} weights",
                self.rank,
                self.weights.len()
            )));
        }
        if let Some(w) = self.weights.iter().find(|w| w.is_nan() || **w < 0.0) {
            return Err(FitError::Checkpoint(format!(
                "checkpoint stores negative or NaN weight {}",
                w
            )));
        }
        for (mode, (factor, &dim)) in self.factors.iter().zip(&self.dims).enumerate() {
            let entries = dim.checked_mul(self.rank).ok_or_else(|| {
                FitError::Checkpoint(format!(
                    "factor {} size {} × {} overflows",
                    mode, dim, self.rank
                ))
            })?;
            if factor.len() != entries {
                return Err(FitError::ShapeMismatch(format!(
                    "factor {} has {} entries, expected {} × {}",
                    mode,
                    factor.len(),
                    dim,
                    self.rank
                )));
            }
        }
        Ok(())
    }

    /// Rebuild the model in element type `T`
    ///
    /// # Errors
    ///
    /// [`FitError::Checkpoint`] for a foreign header or a value that `T`
    /// cannot represent; [`FitError::ShapeMismatch`] for inconsistent sizes.
    pub fn into_model<T: FitScalar>(self) -> FitResult<KruskalTensor<T>> {
        self.validate()?;
        let weights = Array1::from(convert_values::<T>(&self.weights)?);
        let factors = self
            .factors
            .iter()
            .zip(&self.dims)
            .map(|(values, &dim)| {
                Array2::from_shape_vec((dim, self.rank), convert_values::<T>(values)?)
                    .map_err(|e| FitError::ShapeMismatch(e.to_string()))
            })
            .collect::<FitResult<Vec<_>>>()?;
        KruskalTensor::new(factors, weights)
    }

    pub fn to_json_string(&self) -> FitResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FitError::Checkpoint(format!("JSON encoding failed: {}", e)))
    }

    pub fn from_json_str(json: &str) -> FitResult<Self> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| FitError::Checkpoint(format!("JSON decoding failed: {}", e)))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> FitResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| FitError::Checkpoint(format!("binary encoding failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> FitResult<Self> {
        let (checkpoint, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| FitError::Checkpoint(format!("binary decoding failed: {}", e)))?;
        if read != bytes.len() {
            return Err(FitError::Checkpoint(format!(
                "{} trailing bytes after checkpoint",
                bytes.len() - read
            )));
        }
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> FitResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?)?;
        tracing::debug!(path = %path.display(), rank = self.rank, "checkpoint written");
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> FitResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

fn convert_values<T: FitScalar>(values: &[f64]) -> FitResult<Vec<T>> {
    values
        .iter()
        .map(|&v| {
            T::from_f64_checked(v)
                .ok_or_else(|| FitError::Checkpoint(format!("value {} not representable", v)))
        })
        .collect()
}
