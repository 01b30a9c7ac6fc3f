use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use denoising_trainer::{
    BarsDataset, DataDims, DenseAutoencoder, Float, NoisyTrainer, TrainerConfig, telemetry,
};
use tracing::{error, info};

/// Train a dense denoising autoencoder on synthetic bar images.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// TOML file with a [trainer] table; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// Train on clean inputs
    #[arg(long)]
    no_denoise: bool,
    /// Save reconstruction snapshots
    #[arg(long)]
    plot_reconstruction: bool,
    /// Also draw snapshots in the terminal
    #[arg(long)]
    use_gui: bool,
    /// Iterations to run (defaults to the config's max_iterations)
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    output_root: Option<PathBuf>,
    #[arg(long, default_value_t = 16)]
    height: usize,
    #[arg(long, default_value_t = 16)]
    width: usize,
    #[arg(long, default_value_t = 1)]
    channels: usize,
    /// Hidden layer widths
    #[arg(long, value_delimiter = ',', default_value = "64")]
    hidden: Vec<usize>,
    #[arg(long, default_value_t = 0.01)]
    lr: Float,
}

impl Args {
    fn trainer_config(&self) -> denoising_trainer::Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load_from_file(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.no_denoise {
            config.denoise_train = false;
        }
        config.plot_reconstruction |= self.plot_reconstruction;
        config.use_gui |= self.use_gui;
        if let Some(iterations) = self.iterations {
            config.max_iterations = iterations;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        Ok(config)
    }
}

fn run(args: &Args) -> denoising_trainer::Result<()> {
    let config = args.trainer_config()?;
    let dims = DataDims::new(args.height, args.width, args.channels);
    let seed = config.seed.unwrap_or(0);

    let network = DenseAutoencoder::new("dense-ae", dims, &args.hidden, args.lr, seed)?;
    let dataset = BarsDataset::new(dims, seed)?;
    let mut trainer = NoisyTrainer::new(network, dataset, config)?;

    let report = trainer.train()?;
    if let Some(last) = report.test_errors.last() {
        info!(
            iterations = report.iterations,
            error = last.error,
            "finished; last reconstruction error per pixel"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = telemetry::init_tracing() {
        eprintln!("{e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("training failed: {e}");
            ExitCode::FAILURE
        }
    }
}
