//! Training-loop driver for denoising autoencoders.
//!
//! [`NoisyTrainer`] pulls batches from a [`Dataset`], corrupts them with salt-and-pepper and
//! Gaussian noise, trains a [`Network`] to undo the corruption, and every few hundred
//! iterations measures the per-pixel reconstruction error and snapshots
//! original/noisy/reconstructed triples to `models/<network>/reconstruction/`.
//!
//! The network and dataset are collaborators behind traits. [`DenseAutoencoder`] and
//! [`BarsDataset`] are small reference implementations.
//!
//! ```rust
//! use denoising_trainer::{BarsDataset, DataDims, DenseAutoencoder, NoisyTrainer, TrainerConfig};
//!
//! # fn main() -> denoising_trainer::Result<()> {
//! let dims = DataDims::new(6, 6, 1);
//! let network = DenseAutoencoder::new("bars-ae", dims, &[16], 0.01, 0)?;
//! let dataset = BarsDataset::new(dims, 0)?;
//! let config = TrainerConfig {
//!     batch_size: 4,
//!     seed: Some(0),
//!     ..TrainerConfig::default()
//! };
//! let mut trainer = NoisyTrainer::new(network, dataset, config)?;
//! let report = trainer.train_for(40)?;
//! assert_eq!(report.losses.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod autoencoder;
pub mod canvas;
pub mod config;
pub mod dataset;
pub mod error;
pub mod network;
pub mod noise;
pub mod synthetic;
pub mod telemetry;
pub mod trainer;
pub mod types;
pub mod viewer;

pub use autoencoder::DenseAutoencoder;
pub use config::TrainerConfig;
pub use dataset::{DataDims, Dataset};
pub use error::{Error, Result};
pub use network::Network;
pub use noise::NoiseConfig;
pub use synthetic::BarsDataset;
pub use trainer::{LossRecord, NoisyTrainer, TestRecord, TrainReport};
pub use types::{Batch, BatchView, Float, Image, ImageView};
pub use viewer::{TerminalViewer, Viewer};
