//! Example: Window regression forecasting on a noisy seasonal series
//!
//! Trains a linear forecaster on sliding windows, saves it to a temporary
//! model store, reloads the latest save and forecasts the next steps.
//!
//! Run with: cargo run -p tsreg --example forecasting

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tsreg::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Window Regression Forecasting ===\n");

    let look_back = 24;
    let horizon = 6;
    let series = generate_series(1_200, 42);

    println!("Forecasting setup:");
    println!("  Series length: {}", series.len());
    println!("  Look-back window: {} steps", look_back);
    println!("  Forecast horizon: {} steps\n", horizon);

    let (train, valid) = split_series(&series, 0.2)?;
    let generator = WindowGenerator::new(look_back, horizon)?;
    println!("Data splits:");
    println!("  Train: {} observations, {} windows", train.len(), generator.count(train.len()));
    println!("  Valid: {} observations, {} windows\n", valid.len(), generator.count(valid.len()));

    let config = RegressorConfig::new(look_back, horizon)
        .with_batch_size(32)
        .with_seed(7);
    let mut reg = WindowRegressor::new(config)?;
    reg.build_model(5e-3)?;

    let options = TrainOptions::default()
        .with_epochs(300)
        .with_patience(20)
        .with_verbose(false);
    let history = reg.train(train, valid, options)?;

    println!("Training:");
    println!("  Epochs run: {}", history.epochs_run());
    if let (Some(epoch), Some(loss)) = (history.best_epoch, history.best_loss) {
        println!("  Best valid MSE: {:.6} (epoch {})", loss, epoch + 1);
    }
    println!("  Stopped early: {}\n", history.stopped_early);

    println!("{}", reg.model()?.summary());

    let dir = tempfile::tempdir()?;
    let store = ModelStore::new(dir.path(), "seasonal");
    let entry = reg.save(&store)?;
    println!("Saved to {}", entry.path.display());

    let restored = WindowRegressor::from_latest(&store)?;
    let forecast = restored.forecast_next(&series)?;
    println!("\nNext {} steps:", horizon);
    for (step, value) in forecast.iter().enumerate() {
        println!("  t+{}: {:.4}", step + 1, value);
    }

    Ok(())
}

/// Trend plus two seasonal components plus noise.
fn generate_series(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|t| {
            let t = t as f32;
            let trend = 0.002 * t;
            let daily = (t * std::f32::consts::TAU / 24.0).sin();
            let weekly = 0.5 * (t * std::f32::consts::TAU / 168.0).cos();
            trend + daily + weekly + (rng.gen::<f32>() - 0.5) * 0.2
        })
        .collect()
}
