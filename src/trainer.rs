use std::thread;
use std::time::{Duration, Instant};

use ndarray::{CowArray, Ix4};
use ndarray_rand::rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    canvas,
    config::TrainerConfig,
    dataset::{DataDims, Dataset},
    error::{Error, Result},
    network::Network,
    noise,
    types::{Batch, BatchView, Float},
    viewer::{TerminalViewer, Viewer},
};

/// A logged training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossRecord {
    pub iteration: usize,
    pub loss: Float,
    /// Wall-clock time of the iteration up to the log line.
    pub elapsed: Duration,
}

/// A periodic test run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestRecord {
    pub iteration: usize,
    /// Mean per-pixel reconstruction error.
    pub error: Float,
}

/// What [`NoisyTrainer::train_for`] logged, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    pub iterations: usize,
    pub losses: Vec<LossRecord>,
    pub test_errors: Vec<TestRecord>,
}

/// Drives a [`Network`] over a [`Dataset`]: corrupt, train, and every `visualize_every`
/// iterations visualize, test and optionally snapshot reconstructions.
pub struct NoisyTrainer<N, D> {
    network: N,
    dataset: D,
    config: TrainerConfig,
    data_dims: DataDims,
    rng: StdRng,
    viewer: Option<Box<dyn Viewer>>,
    epoch: usize,
}

impl<N: Network, D: Dataset> NoisyTrainer<N, D> {
    /// Validates `config` and sets up the RNG and, with `use_gui`, a terminal viewer.
    pub fn new(network: N, dataset: D, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let data_dims = dataset.data_dims();
        if data_dims.is_empty() {
            return Err(Error::InvalidShape(format!(
                "dataset dims {data_dims} have no elements"
            )));
        }
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let viewer: Option<Box<dyn Viewer>> = if config.use_gui {
            Some(Box::new(TerminalViewer::stdout()))
        } else {
            None
        };
        info!(network = network.name(), dims = %data_dims, batch_size = config.batch_size, "trainer ready");

        Ok(Self {
            network,
            dataset,
            config,
            data_dims,
            rng,
            viewer,
            epoch: 0,
        })
    }

    /// Replaces the display surface used after every reconstruction snapshot.
    #[must_use]
    pub fn with_viewer(mut self, viewer: impl Viewer + 'static) -> Self {
        self.viewer = Some(Box::new(viewer));
        self
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// `iteration / visualize_every` of the last visualize step.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn into_parts(self) -> (N, D) {
        (self.network, self.dataset)
    }

    /// The input the network trains on: `original` itself with `denoise_train` off,
    /// otherwise a corrupted copy clamped to the dataset range.
    pub fn get_noisy_input<'a>(
        &mut self,
        original: BatchView<'a>,
    ) -> Result<CowArray<'a, Float, Ix4>> {
        if !self.config.denoise_train {
            return Ok(CowArray::from(original));
        }
        let noisy = noise::corrupt(
            original,
            self.dataset.range(),
            &self.config.noise,
            &mut self.rng,
        )?;
        Ok(CowArray::from(noisy))
    }

    /// Runs `max_iterations` iterations.
    pub fn train(&mut self) -> Result<TrainReport> {
        self.train_for(self.config.max_iterations)
    }

    /// Runs `iterations` iterations. The first error from the network, the dataset or the
    /// filesystem stops the loop and is returned.
    pub fn train_for(&mut self, iterations: usize) -> Result<TrainReport> {
        let mut report = TrainReport::default();
        let batch_size = self.config.batch_size;

        for iteration in 0..iterations {
            let iter_time = Instant::now();
            let checkpoint = iteration % self.config.visualize_every == 0;

            if checkpoint {
                self.epoch = iteration / self.config.visualize_every;
                self.network.visualize(self.epoch)?;
            }

            let images = self.dataset.next_batch(batch_size)?;
            check_batch("training", &images, batch_size, self.data_dims)?;
            let noisy_input = self.get_noisy_input(images.view())?;
            let train_loss = self.network.train(noisy_input.view(), images.view())?;

            if iteration % self.config.log_every == 0 {
                let elapsed = iter_time.elapsed();
                info!(
                    "Iteration {iteration}: Reconstruction loss {train_loss:.6}, time per iter {:.4}s",
                    elapsed.as_secs_f64()
                );
                report.losses.push(LossRecord {
                    iteration,
                    loss: train_loss,
                    elapsed,
                });
            }

            if checkpoint {
                let test_error = self.test(self.config.test_batches)?;
                info!("Reconstruction error @{iteration} per pixel: {test_error:.6}");
                report.test_errors.push(TestRecord {
                    iteration,
                    error: test_error,
                });
            }
            report.iterations = iteration + 1;
        }
        Ok(report)
    }

    /// Mean per-pixel reconstruction error over `num_batch` test batches.
    ///
    /// With `plot_reconstruction` on, the first batch is also rendered into the snapshot
    /// folder under the current epoch.
    pub fn test(&mut self, num_batch: usize) -> Result<Float> {
        if num_batch == 0 {
            return Err(Error::InvalidConfig("num_batch must be > 0".to_owned()));
        }
        let batch_size = self.config.batch_size;
        let mut error = 0.;

        for test_iter in 0..num_batch {
            let test_image = self.dataset.next_test_batch(batch_size)?;
            check_batch("test", &test_image, batch_size, self.data_dims)?;
            let noisy_test_image = self.get_noisy_input(test_image.view())?;
            let reconstruction = self.network.test(noisy_test_image.view())?;
            error += per_pixel_error(
                test_image.view(),
                reconstruction.view(),
                self.data_dims,
                batch_size,
            )?;

            if test_iter == 0 && self.config.plot_reconstruction {
                let epoch = self.epoch;
                let num_plot = self.config.num_plot;
                self.plot_reconstruction(
                    epoch,
                    test_image.view(),
                    noisy_test_image.view(),
                    reconstruction.view(),
                    num_plot,
                )?;
            }
        }
        Ok(error / num_batch as Float)
    }

    /// Writes `current.png` and `epoch<epoch>.png` for the first `num_plot` samples and
    /// redraws the viewer, if any, pausing for `gui_pause_ms` afterwards.
    pub fn plot_reconstruction(
        &mut self,
        epoch: usize,
        test_image: BatchView<'_>,
        noisy_image: BatchView<'_>,
        reconstruction: BatchView<'_>,
        num_plot: usize,
    ) -> Result<()> {
        let dataset = &self.dataset;
        let canvas = canvas::build_canvas(
            self.data_dims,
            test_image,
            noisy_image,
            reconstruction,
            num_plot,
            |sample| dataset.display(sample),
        )?;

        let dir = self.config.reconstruction_dir(self.network.name());
        canvas::write_snapshots(canvas.view(), &dir, epoch)?;

        if let Some(viewer) = self.viewer.as_mut() {
            let title = format!("Reconstruction of {}", self.network.name());
            viewer.show(&title, canvas.view())?;
            debug!(pause_ms = self.config.gui_pause_ms, "viewer redrawn");
            thread::sleep(self.config.gui_pause());
        }
        Ok(())
    }
}

/// `sum((reconstruction - original)^2) / (height * width) / batch_size`.
pub fn per_pixel_error(
    original: BatchView<'_>,
    reconstruction: BatchView<'_>,
    dims: DataDims,
    batch_size: usize,
) -> Result<Float> {
    if original.shape() != reconstruction.shape() {
        return Err(Error::InvalidShape(format!(
            "reconstruction shape {:?} does not match test batch shape {:?}",
            reconstruction.shape(),
            original.shape()
        )));
    }
    let squared: Float = (&reconstruction - &original).mapv(|d| d * d).sum();
    Ok(squared / dims.area() as Float / batch_size as Float)
}

fn check_batch(label: &str, batch: &Batch, n: usize, dims: DataDims) -> Result<()> {
    if batch.dim() != dims.batch_shape(n) {
        return Err(Error::InvalidShape(format!(
            "{label} batch has shape {:?}, expected {:?}",
            batch.shape(),
            dims.batch_shape(n)
        )));
    }
    Ok(())
}
