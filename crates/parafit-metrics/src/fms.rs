//! Factor match score
//!
//! Compares two Kruskal models of the same rank and shape up to the
//! permutation and scaling indeterminacy of the CP model. Component pairs are
//! scored by
//!
//! ```text
//! s(i, j) = (1 − |λᵢ − λⱼ| / max(λᵢ, λⱼ)) · Πₙ cos(aₙᵢ, bₙⱼ)
//! ```
//!
//! where λ is the magnitude of a component (its weight times the norms of its
//! factor columns), and the best one-to-one pairing is found by the
//! Hungarian algorithm.

use crate::assignment::max_score_assignment;
use crate::error::{ScoreError, ScoreResult};
use parafit_decomp::{FitScalar, KruskalTensor};
use scirs2_core::ndarray_ext::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// How per-component scores are combined into one number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FmsReduction {
    #[default]
    Mean,
    Min,
    Product,
}

/// Treatment of the sign indeterminacy of factor columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignHandling {
    /// Compare absolute cosines
    #[default]
    Absolute,
    /// Bring both models to the canonical sign convention first and count
    /// negative cosine products as no match
    AlignSigns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmsOptions {
    /// Penalise components whose magnitudes differ
    pub weight_penalty: bool,
    pub reduction: FmsReduction,
    pub sign_handling: SignHandling,
}

impl Default for FmsOptions {
    fn default() -> Self {
        Self {
            weight_penalty: true,
            reduction: FmsReduction::Mean,
            sign_handling: SignHandling::Absolute,
        }
    }
}

impl FmsOptions {
    pub fn with_weight_penalty(mut self, weight_penalty: bool) -> Self {
        self.weight_penalty = weight_penalty;
        self
    }

    pub fn with_reduction(mut self, reduction: FmsReduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_sign_handling(mut self, sign_handling: SignHandling) -> Self {
        self.sign_handling = sign_handling;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FmsResult {
    /// Reduced score in `[0, 1]`
    pub score: f64,
    /// `permutation[i] = j` pairs component `i` of the first model with
    /// component `j` of the second
    pub permutation: Vec<usize>,
    /// Score of each matched pair, indexed by component of the first model
    pub component_scores: Vec<f64>,
    /// All pairwise scores, rows indexed by the first model
    pub similarity: Array2<f64>,
}

/// Score how well `b` recovers the components of `a`
///
/// # Errors
///
/// [`ScoreError::ShapeMismatch`] when the ranks, the number of modes or any
/// mode dimension differ.
///
/// # Examples
///
/// ```
/// use parafit_decomp::KruskalTensor;
/// use parafit_metrics::{factor_match_score, FmsOptions};
///
/// let a = KruskalTensor::<f64>::random_init(&[5, 6, 7], 3, 1).unwrap();
/// let mut b = a.clone();
/// b.permute_components(&[2, 0, 1]).unwrap();
///
/// let fms = factor_match_score(&a, &b, &FmsOptions::default()).unwrap();
/// assert_eq!(fms.score, 1.0);
/// assert_eq!(fms.permutation, vec![1, 2, 0]);
/// ```
pub fn factor_match_score<T: FitScalar>(
    a: &KruskalTensor<T>,
    b: &KruskalTensor<T>,
    options: &FmsOptions,
) -> ScoreResult<FmsResult> {
    if a.rank() != b.rank() {
        return Err(ScoreError::ShapeMismatch(format!(
            "cannot match rank {} against rank {}",
            a.rank(),
            b.rank()
        )));
    }
    if a.shape() != b.shape() {
        return Err(ScoreError::ShapeMismatch(format!(
            "model shapes differ: {:?} vs {:?}",
            a.shape(),
            b.shape()
        )));
    }

    let (first, second) = match options.sign_handling {
        SignHandling::Absolute => (ComponentView::new(a), ComponentView::new(b)),
        SignHandling::AlignSigns => {
            let mut a = a.clone();
            let mut b = b.clone();
            a.align_signs();
            b.align_signs();
            (ComponentView::new(&a), ComponentView::new(&b))
        }
    };

    let rank = a.rank();
    let similarity = Array2::from_shape_fn((rank, rank), |(i, j)| {
        let penalty = if options.weight_penalty {
            magnitude_agreement(first.magnitudes[i], second.magnitudes[j])
        } else {
            1.0
        };
        let congruence: f64 = first
            .factors
            .iter()
            .zip(&second.factors)
            .zip(first.squared_norms.iter().zip(&second.squared_norms))
            .map(|((fa, fb), (na, nb))| {
                cosine(&fa.column(i), &fb.column(j), na[i], nb[j])
            })
            .product();
        match options.sign_handling {
            SignHandling::Absolute => penalty * congruence.abs(),
            SignHandling::AlignSigns => penalty * congruence.max(0.0),
        }
    });

    let assignment = max_score_assignment(&similarity.view())?;
    let component_scores: Vec<f64> = assignment
        .columns
        .iter()
        .enumerate()
        .map(|(i, &j)| similarity[[i, j]])
        .collect();

    let score = match options.reduction {
        FmsReduction::Mean => component_scores.iter().sum::<f64>() / rank as f64,
        FmsReduction::Min => component_scores.iter().copied().fold(f64::INFINITY, f64::min),
        FmsReduction::Product => component_scores.iter().product(),
    };

    tracing::debug!(
        rank,
        score,
        reduction = ?options.reduction,
        permutation = ?assignment.columns,
        "factor match score"
    );

    Ok(FmsResult {
        score,
        permutation: assignment.columns,
        component_scores,
        similarity,
    })
}

/// Factors of one model in `f64` with cached column norms and magnitudes
struct ComponentView {
    factors: Vec<Array2<f64>>,
    squared_norms: Vec<Vec<f64>>,
    magnitudes: Vec<f64>,
}

impl ComponentView {
    fn new<T: FitScalar>(model: &KruskalTensor<T>) -> Self {
        let factors: Vec<Array2<f64>> = model
            .factors()
            .iter()
            .map(|f| f.mapv(|x| x.to_f64_lossy()))
            .collect();
        let squared_norms: Vec<Vec<f64>> = factors
            .iter()
            .map(|f| f.columns().into_iter().map(|c| dot(&c, &c)).collect())
            .collect();
        let magnitudes = model
            .weights()
            .iter()
            .enumerate()
            .map(|(r, w)| {
                squared_norms
                    .iter()
                    .fold(w.to_f64_lossy().abs(), |acc, norms| acc * norms[r].sqrt())
            })
            .collect();
        Self {
            factors,
            squared_norms,
            magnitudes,
        }
    }
}

fn dot(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine of two columns; zero when either column is zero
fn cosine(a: &ArrayView1<f64>, b: &ArrayView1<f64>, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

/// `1 − |λᵢ − λⱼ| / max(λᵢ, λⱼ)`, with two zero magnitudes agreeing fully
fn magnitude_agreement(x: f64, y: f64) -> f64 {
    let largest = x.max(y);
    if largest == 0.0 {
        1.0
    } else {
        1.0 - (x - y).abs() / largest
    }
}
