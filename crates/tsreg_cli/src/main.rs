//! tsreg CLI for training, forecasting and inspecting saved models.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsreg_data::{read_csv_series, read_npy_series, split_series};
use tsreg_train::{
    parse_minute, ModelStore, RegressorConfig, SaveSelection, TrainOptions, WindowRegressor,
    DEFAULT_LR,
};

#[derive(Parser)]
#[command(name = "tsreg")]
#[command(author, version)]
#[command(about = "Linear window regression forecasting with timestamped model saves")]
#[command(long_about = "tsreg: train a one-layer linear forecaster on sliding windows of a series.

EXAMPLES:
  # Train on a .npy series and save under DataStore/SavedModels/Forecasters/sales
  tsreg train --input sales.npy --model-id sales --look-back 14 --horizon 7

  # Train on one column of a CSV file
  tsreg train --input prices.csv --column close --model-id prices

  # Forecast the values following a series with the latest save
  tsreg predict --input sales.npy --model-id sales

  # Forecast with a specific save
  tsreg predict --input sales.npy --model-id sales --at \"2024-03-01@09:15\"

  # List saves
  tsreg saves --model-id sales")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Model identifier (subdirectory of the store)
    #[arg(long, value_name = "ID")]
    model_id: String,

    /// Store root; defaults to DataStore/SavedModels/Forecasters above the
    /// current directory
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,
}

#[derive(Args)]
struct InputArgs {
    /// Series file (.npy or .csv)
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// CSV column to read; defaults to the last column
    #[arg(long, value_name = "NAME")]
    column: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a forecaster and save it
    Train {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        store: StoreArgs,

        /// Observations per input window
        #[arg(long, default_value = "4", value_name = "N")]
        look_back: usize,

        /// Observations predicted per window
        #[arg(long, default_value = "1", value_name = "N")]
        horizon: usize,

        /// Maximum number of epochs
        #[arg(long, default_value = "1000", value_name = "N")]
        epochs: usize,

        /// Early stopping patience
        #[arg(long, default_value = "15", value_name = "N")]
        patience: usize,

        /// Train for all epochs
        #[arg(long)]
        no_early_stopping: bool,

        /// Learning rate for Adam optimizer
        #[arg(long, default_value_t = DEFAULT_LR, value_name = "LR")]
        lr: f64,

        /// Batch size for training
        #[arg(long, default_value = "32", value_name = "SIZE")]
        batch_size: usize,

        /// Shuffle buffer size; 0 keeps chronological order
        #[arg(long, default_value = "2000", value_name = "SIZE")]
        shuffle_buffer: usize,

        /// Fraction of the series held out for validation
        #[arg(long, default_value = "0.2", value_name = "RATIO")]
        valid_ratio: f32,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42", value_name = "SEED")]
        seed: u64,
    },
    /// Forecast the values following a series
    Predict {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        store: StoreArgs,

        /// Use the save made in this minute (YYYY-MM-DD@HH:MM)
        #[arg(long, value_name = "STAMP", conflicts_with = "name")]
        at: Option<String>,

        /// Use the save with this directory name
        #[arg(long, value_name = "DIR")]
        name: Option<String>,
    },
    /// List saves of a model, oldest first
    Saves {
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Train {
            input,
            store,
            look_back,
            horizon,
            epochs,
            patience,
            no_early_stopping,
            lr,
            batch_size,
            shuffle_buffer,
            valid_ratio,
            seed,
        } => {
            let config = RegressorConfig::new(look_back, horizon)
                .with_batch_size(batch_size)
                .with_shuffle_buffer((shuffle_buffer > 0).then_some(shuffle_buffer))
                .with_seed(seed);
            let options = TrainOptions::default()
                .with_epochs(epochs)
                .with_patience(patience)
                .with_early_stopping(!no_early_stopping)
                .with_verbose(cli.verbose > 0);
            handle_train(&input, &store, config, options, lr, valid_ratio)
        }
        Commands::Predict {
            input,
            store,
            at,
            name,
        } => handle_predict(&input, &store, at, name),
        Commands::Saves { store } => handle_saves(&store),
    }
}

fn open_store(args: &StoreArgs) -> Result<ModelStore> {
    match &args.store {
        Some(root) => Ok(ModelStore::new(root, &args.model_id)),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            ModelStore::discover(&cwd, &args.model_id)
                .context("No --store given and no DataStore directory found")
        }
    }
}

fn read_series(args: &InputArgs) -> Result<Vec<f32>> {
    let path: &Path = &args.input;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let series = match extension.as_deref() {
        Some("npy") => read_npy_series(path),
        Some("csv") => read_csv_series(path, args.column.as_deref()),
        _ => bail!(
            "Unsupported input '{}': expected a .npy or .csv file",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to read series from {}", path.display()))?;

    tracing::info!(path = %path.display(), len = series.len(), "loaded series");
    Ok(series)
}

fn handle_train(
    input: &InputArgs,
    store: &StoreArgs,
    config: RegressorConfig,
    options: TrainOptions,
    lr: f64,
    valid_ratio: f32,
) -> Result<()> {
    let store = open_store(store)?;
    let series = read_series(input)?;
    let (train, valid) = split_series(&series, valid_ratio)?;

    println!(
        "Training on {} observations, validating on {} (look_back={}, horizon={})",
        train.len(),
        valid.len(),
        config.look_back,
        config.forecast
    );

    let mut regressor = WindowRegressor::new(config)?;
    regressor.build_model(lr)?;
    let history = regressor.train(train, valid, options)?;

    println!("Epochs run: {}", history.epochs_run());
    if let (Some(epoch), Some(loss)) = (history.best_epoch, history.best_loss) {
        println!("Best loss:  {:.6} (epoch {})", loss, epoch + 1);
    }
    if history.stopped_early {
        println!("Stopped early");
    }

    let entry = regressor.save(&store)?;
    println!("Saved to {}", entry.path.display());
    Ok(())
}

fn handle_predict(
    input: &InputArgs,
    store: &StoreArgs,
    at: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let store = open_store(store)?;
    let selection = match (at, name) {
        (Some(at), _) => SaveSelection::At(
            parse_minute(&at).with_context(|| format!("Invalid --at '{}'", at))?,
        ),
        (None, Some(name)) => SaveSelection::Named(name),
        (None, None) => SaveSelection::Latest,
    };

    let regressor = WindowRegressor::load(&store, &selection)?;
    let series = read_series(input)?;
    let forecast = regressor.forecast_next(&series)?;

    for value in forecast {
        println!("{}", value);
    }
    Ok(())
}

fn handle_saves(store: &StoreArgs) -> Result<()> {
    let store = open_store(store)?;
    let saves = store.list_saves()?;

    if saves.is_empty() {
        println!("No saves for '{}' in {}", store.model_id(), store.root().display());
        return Ok(());
    }

    println!("Saves for '{}':\n", store.model_id());
    for save in saves {
        println!("  {:<20} {}", save.name(), save.path.display());
    }
    Ok(())
}
