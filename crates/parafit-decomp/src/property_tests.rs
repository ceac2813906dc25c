//! Property-based tests for Kruskal models and ALS
//!
//! Fits are expensive, so the case count is kept small.

use crate::{cp_als_fit, FitConfig, KruskalCheckpoint, KruskalTensor};
use proptest::prelude::*;

fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 5,
        max_local_rejects: 1000,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Normalising moves scale into the weights without changing the tensor
    #[test]
    fn prop_normalize_preserves_reconstruction(
        dims in prop::collection::vec(2usize..5, 2..4),
        rank in 1usize..4,
        seed in any::<u64>(),
    ) {
        let mut model = KruskalTensor::<f64>::random_init(&dims, rank, seed).unwrap();
        let scaled: Vec<_> = model
            .factors()
            .iter()
            .enumerate()
            .map(|(n, f)| f * (n as f64 + 2.0))
            .collect();
        model = KruskalTensor::new(scaled, model.weights().clone()).unwrap();

        let before = model.construct_tensor().unwrap();
        let after = model.normalized().construct_tensor().unwrap();
        let diff = before.squared_distance(&after).unwrap().sqrt();
        prop_assert!(diff <= 1e-10 * before.frobenius_norm().max(1.0));
    }

    /// Permuting components never changes the reconstruction
    #[test]
    fn prop_permutation_invariance(
        dims in prop::collection::vec(2usize..5, 3),
        seed in any::<u64>(),
    ) {
        let model = KruskalTensor::<f64>::random_init(&dims, 3, seed).unwrap();
        let mut permuted = model.clone();
        permuted.permute_components(&[2, 0, 1]).unwrap();
        let diff = model
            .construct_tensor()
            .unwrap()
            .squared_distance(&permuted.construct_tensor().unwrap())
            .unwrap();
        prop_assert!(diff < 1e-20);
    }

    /// ALS never reports a loss above that of its best sweep
    #[test]
    fn prop_fit_reports_minimum_loss(seed in 0u64..1000, rank in 1usize..3) {
        let truth = KruskalTensor::<f64>::random_init(&[4, 5, 3], 2, seed).unwrap();
        let tensor = truth.construct_tensor().unwrap();
        let config = FitConfig::default()
            .with_n_restarts(2)
            .with_max_iterations(40)
            .with_seed(seed);
        let fit = cp_als_fit(&tensor, rank, &config).unwrap();
        let min = fit.trace.losses.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(fit.final_loss(), min);
        prop_assert!(fit.final_loss() <= 1.0 + 1e-9);
        prop_assert_eq!(fit.trace.losses.len(), fit.trace.iterations);
    }

    /// Checkpoints rebuild a model bit for bit
    #[test]
    fn prop_checkpoint_exact(
        dims in prop::collection::vec(1usize..5, 2..4),
        rank in 1usize..4,
        seed in any::<u64>(),
    ) {
        let model = KruskalTensor::<f64>::random_init(&dims, rank, seed).unwrap();
        let bytes = KruskalCheckpoint::from_model(&model).to_bytes().unwrap();
        let restored: KruskalTensor<f64> =
            KruskalCheckpoint::from_bytes(&bytes).unwrap().into_model().unwrap();
        prop_assert_eq!(restored, model);
    }
}
