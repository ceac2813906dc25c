//! Recovery of known factors by CP-ALS, scored with the factor match score

use parafit_core::DenseND;
use parafit_decomp::{cp_als_fit, FitConfig, KruskalTensor};
use parafit_metrics::{
    core_consistency, factor_match_score, model_completion_score, FmsOptions, FmsReduction,
    SignHandling,
};
use scirs2_core::random::{rngs::StdRng, SeedableRng};

fn noiseless(shape: &[usize], rank: usize, seed: u64) -> (KruskalTensor<f64>, DenseND<f64>) {
    let truth = KruskalTensor::<f64>::random_init(shape, rank, seed).unwrap();
    let tensor = truth.construct_tensor().unwrap();
    (truth, tensor)
}

#[test]
fn test_noiseless_recovery_with_restarts() {
    let (truth, tensor) = noiseless(&[10, 12, 14], 3, 42);
    let config = FitConfig::default().with_n_restarts(5).with_seed(7);
    let fit = cp_als_fit(&tensor, 3, &config).unwrap();

    assert!(fit.converged());
    assert!(fit.final_loss() < 1e-6);
    assert_eq!(fit.restarts.len(), 5);

    let fms = factor_match_score(&truth, &fit.model, &FmsOptions::default()).unwrap();
    assert!(fms.score > 0.99, "FMS {}", fms.score);

    let strict = FmsOptions::default().with_reduction(FmsReduction::Min);
    let fms = factor_match_score(&truth, &fit.model, &strict).unwrap();
    assert!(fms.score > 0.99, "minimum component FMS {}", fms.score);
}

#[test]
fn test_recovery_with_noise() {
    let (truth, clean) = noiseless(&[8, 9, 10], 2, 3);
    let mut rng = StdRng::seed_from_u64(4);
    let scale = 0.01 * clean.frobenius_norm() / (clean.len() as f64).sqrt();
    let noise = DenseND::<f64>::random_normal_with(clean.shape(), 0.0, scale, &mut rng).unwrap();
    let data: Vec<f64> = clean.iter().zip(noise.iter()).map(|(x, e)| x + e).collect();
    let tensor = DenseND::from_vec(data, clean.shape()).unwrap();

    let fit = cp_als_fit(&tensor, 2, &FitConfig::default().with_n_restarts(4)).unwrap();
    assert!(fit.final_loss() < 0.05);

    let options = FmsOptions::default().with_sign_handling(SignHandling::AlignSigns);
    let fms = factor_match_score(&truth, &fit.model, &options).unwrap();
    assert!(fms.score > 0.9, "FMS {}", fms.score);
}

#[test]
fn test_permuted_model_self_score() {
    let (truth, _) = noiseless(&[5, 6, 7], 4, 11);
    let mut shuffled = truth.clone();
    shuffled.permute_components(&[3, 1, 0, 2]).unwrap();

    let same = factor_match_score(&truth, &truth, &FmsOptions::default()).unwrap();
    assert_eq!(same.score, 1.0);
    assert_eq!(same.permutation, vec![0, 1, 2, 3]);

    let fms = factor_match_score(&truth, &shuffled, &FmsOptions::default()).unwrap();
    assert!((fms.score - 1.0).abs() < 1e-12);
    assert_eq!(fms.permutation, vec![2, 1, 3, 0]);
}

#[test]
fn test_core_consistency_of_fitted_model() {
    let (_, tensor) = noiseless(&[6, 7, 8], 2, 19);
    let fit = cp_als_fit(&tensor, 2, &FitConfig::default().with_n_restarts(3)).unwrap();
    let cc = core_consistency(&tensor, &fit.model).unwrap();
    assert!(cc > 99.0, "core consistency {}", cc);
}

#[test]
fn test_completion_score_of_fitted_model() {
    let (_, tensor) = noiseless(&[5, 6, 7], 2, 8);
    let fit = cp_als_fit(&tensor, 2, &FitConfig::default().with_n_restarts(3)).unwrap();

    // Every third entry held out
    let mask_values: Vec<f64> = (0..tensor.len())
        .map(|i| if i % 3 == 0 { 0.0 } else { 1.0 })
        .collect();
    let mask = DenseND::from_vec(mask_values, tensor.shape()).unwrap();
    let score = model_completion_score(&tensor, &fit.model, &mask).unwrap();
    assert!(score < 1e-3);
}
