//! Property-based tests for shape operations and seeded creation

#[cfg(test)]
mod tests {
    use crate::DenseND;
    use proptest::prelude::*;
    use scirs2_core::random::{rngs::StdRng, SeedableRng};

    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 2..=4)
    }

    fn seeded(shape: &[usize], seed: u64) -> DenseND<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        DenseND::random_uniform_with(shape, -1.0, 1.0, &mut rng)
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, ..ProptestConfig::default() })]

        #[test]
        fn prop_fold_unfold_identity(shape in shape_strategy(), seed in 0u64..1000) {
            let tensor = seeded(&shape, seed);
            for mode in 0..shape.len() {
                let unfolded = tensor.unfold(mode).unwrap();
                let others: usize = shape.iter().enumerate()
                    .filter(|&(i, _)| i != mode).map(|(_, &s)| s).product();
                prop_assert_eq!(unfolded.shape(), &[shape[mode], others]);

                let folded = DenseND::fold(&unfolded, &shape, mode).unwrap();
                prop_assert_eq!(&folded, &tensor);
            }
        }

        #[test]
        fn prop_unfold_preserves_norm(shape in shape_strategy(), seed in 0u64..1000) {
            let tensor = seeded(&shape, seed);
            let norm_sq = tensor.squared_norm();
            for mode in 0..shape.len() {
                let m = tensor.unfold(mode).unwrap();
                let m_sq: f64 = m.iter().map(|x| x * x).sum();
                prop_assert!((m_sq - norm_sq).abs() <= 1e-12 * norm_sq.max(1.0));
            }
        }

        #[test]
        fn prop_reshape_roundtrip(shape in shape_strategy(), seed in 0u64..1000) {
            let tensor = seeded(&shape, seed);
            let flat = tensor.reshape(&[tensor.len()]).unwrap();
            let restored = flat.reshape(&shape).unwrap();
            prop_assert_eq!(restored, tensor);
        }

        #[test]
        fn prop_same_seed_same_tensor(shape in shape_strategy(), seed in any::<u64>()) {
            prop_assert_eq!(seeded(&shape, seed), seeded(&shape, seed));
        }
    }
}
