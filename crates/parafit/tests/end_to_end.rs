//! End-to-end: generate, fit, score, persist, warm start

use parafit::prelude::*;
use scirs2_core::random::{rngs::StdRng, SeedableRng};

#[test]
fn test_fit_score_and_checkpoint() {
    let truth = KruskalTensor::<f64>::random_init(&[10, 12, 14], 3, 42).unwrap();
    let tensor = truth.construct_tensor().unwrap();

    let config = FitConfig::default().with_n_restarts(5).with_seed(7);
    let fit = cp_als_fit(&tensor, 3, &config).unwrap();
    assert!(fit.converged());
    assert_eq!(fit.trace.termination, Termination::Converged);
    assert!(fit.trace.final_loss() < 1e-6);

    let fms = factor_match_score(&truth, &fit.model, &FmsOptions::default()).unwrap();
    assert!(fms.score > 0.99, "FMS {}", fms.score);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("best.json");
    KruskalCheckpoint::from_model(&fit.model)
        .with_progress(fit.trace.iterations, fit.final_loss())
        .save_json(&path)
        .unwrap();

    let restored: KruskalTensor<f64> = KruskalCheckpoint::load_json(&path)
        .unwrap()
        .into_model()
        .unwrap();
    assert_eq!(restored, fit.model);

    // Warm start from the checkpoint converges immediately
    let warm = cp_als_fit_with(
        &tensor,
        3,
        &FitConfig::default(),
        &PrecomputedInit::new(restored),
    )
    .unwrap();
    assert!(warm.converged());
    assert!(warm.trace.iterations <= fit.trace.iterations);
}

#[test]
fn test_rank_selection_with_core_consistency() {
    let truth = KruskalTensor::<f64>::random_init(&[6, 7, 8], 2, 5).unwrap();
    let tensor = truth.construct_tensor().unwrap();
    let config = FitConfig::default().with_n_restarts(3);

    let right = cp_als_fit(&tensor, 2, &config).unwrap();
    let cc_right = core_consistency(&tensor, &right.model).unwrap();
    assert!(cc_right > 99.0, "core consistency {}", cc_right);

    let one = cp_als_fit(&tensor, 1, &config).unwrap();
    assert!(one.final_loss() > right.final_loss());
}

#[test]
fn test_trace_serializes_to_json() {
    let mut rng = StdRng::seed_from_u64(3);
    let tensor = DenseND::<f64>::random_normal_with(&[4, 5, 6], 0.0, 1.0, &mut rng).unwrap();
    let config = FitConfig::default().with_max_iterations(5).with_n_restarts(2);
    let fit = cp_als_fit(&tensor, 2, &config).unwrap();

    let json = serde_json::to_value(&fit.trace).unwrap();
    assert_eq!(json["iterations"], fit.trace.iterations);
    assert_eq!(json["losses"].as_array().unwrap().len(), fit.trace.losses.len());
    let summaries = serde_json::to_string(&fit.restarts).unwrap();
    assert!(summaries.contains("\"restart\":1"));
}

#[test]
fn test_errors_surface_through_prelude() {
    let tensor = DenseND::<f64>::zeros(&[3, 4, 5]);
    assert!(matches!(
        cp_als_fit(&tensor, 2, &FitConfig::default()),
        Err(FitError::Rank(_))
    ));
}
