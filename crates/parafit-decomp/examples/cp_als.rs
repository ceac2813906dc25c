//! Multi-restart CP-ALS on a noisy synthetic tensor
//!
//! Builds a rank-4 tensor from random factors, adds a little Gaussian noise,
//! fits it with several restarts and writes the winning model to a JSON
//! checkpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example cp_als --release
//! ```

use anyhow::Result;
use parafit_core::DenseND;
use parafit_decomp::{cp_als_fit, FitConfig, InitMethod, KruskalCheckpoint, KruskalTensor};
use scirs2_core::random::{rngs::StdRng, SeedableRng};
use std::time::Instant;

fn noisy_low_rank(shape: &[usize], rank: usize, noise: f64, seed: u64) -> Result<DenseND<f64>> {
    let truth = KruskalTensor::<f64>::random_init(shape, rank, seed)?;
    let clean = truth.construct_tensor()?;
    let scale = noise * clean.frobenius_norm() / (clean.len() as f64).sqrt();

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let perturbation = DenseND::<f64>::random_normal_with(shape, 0.0, scale, &mut rng)?;
    let data: Vec<f64> = clean
        .iter()
        .zip(perturbation.iter())
        .map(|(x, e)| x + e)
        .collect();
    Ok(DenseND::from_vec(data, shape)?)
}

fn main() -> Result<()> {
    let shape = [20, 25, 30];
    let rank = 4;
    let tensor = noisy_low_rank(&shape, rank, 0.01, 7)?;
    println!("Tensor shape {:?}, rank {} target", shape, rank);

    let config = FitConfig::default()
        .with_n_restarts(6)
        .with_init_strategy(InitMethod::Svd)
        .with_tolerance(1e-9)
        .with_seed(2024);

    let start = Instant::now();
    let fit = cp_als_fit(&tensor, rank, &config)?;
    let elapsed = start.elapsed();

    println!("\nRestart  Init             Iterations  Loss");
    for summary in &fit.restarts {
        match (summary.final_loss, &summary.error) {
            (Some(loss), _) => println!(
                "{:>7}  {:<15}  {:>10}  {:.6e}",
                summary.restart, summary.init, summary.iterations, loss
            ),
            (None, Some(error)) => println!("{:>7}  {:<15}  failed: {}", summary.restart, summary.init, error),
            (None, None) => {}
        }
    }

    println!(
        "\nBest restart {} ({:?}), relative error {:.6e}, explained variance {:.6}",
        fit.best_restart,
        fit.trace.termination,
        fit.final_loss(),
        fit.model.explained_variance(&tensor)?
    );
    for warning in &fit.trace.warnings {
        println!("warning: {}", warning);
    }
    println!("Total time: {:.2?}", elapsed);

    let path = std::env::temp_dir().join("parafit_cp_als_example.json");
    KruskalCheckpoint::from_model(&fit.model)
        .with_progress(fit.trace.iterations, fit.final_loss())
        .save_json(&path)?;
    println!("Checkpoint written to {}", path.display());

    Ok(())
}
