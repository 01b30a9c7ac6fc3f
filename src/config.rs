//! Trainer configuration, loadable from a `[trainer]` TOML table.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::noise::NoiseConfig;

/// Options recognised by [`crate::trainer::NoisyTrainer`].
///
/// # Examples
///
/// ```
/// use denoising_trainer::TrainerConfig;
///
/// let config = TrainerConfig::from_toml_str("[trainer]\nbatch_size = 32\nuse_gui = true")?;
/// assert_eq!(config.batch_size, 32);
/// assert!(config.use_gui);
/// assert!(config.denoise_train);
/// # Ok::<(), denoising_trainer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Samples per training and test batch.
    pub batch_size: usize,
    /// Corrupt inputs before handing them to the network. When off the network sees clean data.
    pub denoise_train: bool,
    /// Render original/noisy/reconstructed triples to disk during testing.
    pub plot_reconstruction: bool,
    /// Also show the rendered canvas on screen.
    pub use_gui: bool,
    /// Iteration cap for [`crate::trainer::NoisyTrainer::train`].
    pub max_iterations: usize,
    /// Period of the visualize/test step, in iterations.
    pub visualize_every: usize,
    /// Period of the loss log line, in iterations.
    pub log_every: usize,
    /// Test batches averaged at every visualize/test step.
    pub test_batches: usize,
    /// Rows of the reconstruction canvas.
    pub num_plot: usize,
    /// Reconstructions land in `<output_root>/<network name>/reconstruction`.
    pub output_root: PathBuf,
    /// Blocking pause after every on-screen redraw.
    pub gui_pause_ms: u64,
    /// Seed for the corruption RNG. Entropy-seeded when absent.
    pub seed: Option<u64>,
    pub noise: NoiseConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            denoise_train: true,
            plot_reconstruction: false,
            use_gui: false,
            max_iterations: 10_000_000,
            visualize_every: 500,
            log_every: 20,
            test_batches: 5,
            num_plot: 3,
            output_root: PathBuf::from("models"),
            gui_pause_ms: 1000,
            seed: None,
            noise: NoiseConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    trainer: TrainerConfig,
}

impl TrainerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses the `[trainer]` table; a missing table or missing keys fall back to defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        file.trainer.validate()?;
        Ok(file.trainer)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("batch_size", self.batch_size),
            ("visualize_every", self.visualize_every),
            ("log_every", self.log_every),
            ("test_batches", self.test_batches),
            ("num_plot", self.num_plot),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.plot_reconstruction && self.num_plot > self.batch_size {
            return Err(Error::InvalidConfig(format!(
                "num_plot {} exceeds batch_size {}",
                self.num_plot, self.batch_size
            )));
        }
        self.noise.validate()
    }

    #[must_use]
    pub fn gui_pause(&self) -> Duration {
        Duration::from_millis(self.gui_pause_ms)
    }

    #[must_use]
    pub fn reconstruction_dir(&self, network_name: &str) -> PathBuf {
        self.output_root.join(network_name).join("reconstruction")
    }
}
