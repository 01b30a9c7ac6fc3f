use ndarray::{Array1, Array2, Axis};
use ndarray_rand::{
    RandomExt,
    rand::{Rng, SeedableRng, rngs::StdRng},
    rand_distr::Normal,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    dataset::DataDims,
    error::{Error, Result},
    network::Network,
    types::{Batch, BatchView, Float, Matrix, Vector},
};

/// Fully connected autoencoder over flattened samples: ReLU hidden layers, linear output,
/// per-sample SGD on `0.5 * ||y - target||^2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseAutoencoder {
    name: String,
    dims: DataDims,
    lr: Float,
    layers: Box<[Layer]>,
}
#[derive(Debug, Clone, Serialize)]
struct Layer {
    weights: Weights,
    biases: Biases,
}
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Weights(Matrix<Float>);
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Biases(Vector<Float>);

impl DenseAutoencoder {
    /// `hidden` lists the widths between the flattened input and the equally wide output.
    pub fn new(
        name: impl Into<String>,
        dims: DataDims,
        hidden: &[usize],
        lr: Float,
        seed: u64,
    ) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::InvalidShape(format!("cannot encode {dims} samples")));
        }
        if hidden.contains(&0) {
            return Err(Error::InvalidConfig("hidden layer widths must be > 0".to_owned()));
        }
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig("lr must be finite and > 0".to_owned()));
        }

        let mut widths = Vec::with_capacity(hidden.len() + 2);
        widths.push(dims.len());
        widths.extend_from_slice(hidden);
        widths.push(dims.len());

        let mut rng = StdRng::seed_from_u64(seed);
        let layers = widths
            .windows(2)
            .map(|pair| Layer::new_random(pair[0], pair[1], &mut rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.into(),
            dims,
            lr,
            layers: layers.into_boxed_slice(),
        })
    }

    #[must_use]
    pub fn run(&self, input: &Array1<Float>) -> Array1<Float> {
        self.layers
            .iter()
            .enumerate()
            .fold(input.clone(), |x, (j, layer)| {
                let z = layer.weights.0.dot(&x) + &layer.biases.0;
                if self.is_output(j) { z } else { relu(z) }
            })
    }

    fn is_output(&self, layer: usize) -> bool {
        layer + 1 == self.layers.len()
    }

    /// One SGD step from `input` towards `target`. Returns the loss before the step.
    pub fn sgd_step(&mut self, input: &Array1<Float>, target: &Array1<Float>) -> Float {
        let lr = self.lr;
        // inputs[j] feeds layer j; pre[j] is its output before the ReLU
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre = Vec::with_capacity(self.layers.len());
        let mut x = input.clone();
        for (j, layer) in self.layers.iter().enumerate() {
            let z = layer.weights.0.dot(&x) + &layer.biases.0;
            let next = if self.is_output(j) { z.clone() } else { relu(z.clone()) };
            inputs.push(std::mem::replace(&mut x, next));
            pre.push(z);
        }

        let mut delta = &x - target;
        let loss = 0.5 * delta.dot(&delta);

        for j in (0..self.layers.len()).rev() {
            let grad_w = delta
                .view()
                .insert_axis(Axis(1))
                .dot(&inputs[j].view().insert_axis(Axis(0)));
            let back = (j > 0).then(|| self.layers[j].weights.0.t().dot(&delta));

            let layer = &mut self.layers[j];
            layer.weights.0.scaled_add(-lr, &grad_w);
            layer.biases.0.scaled_add(-lr, &delta);

            if let Some(mut back) = back {
                ndarray::Zip::from(&mut back)
                    .and(&pre[j - 1])
                    .for_each(|d, &z| {
                        if z <= 0. {
                            *d = 0.;
                        }
                    });
                delta = back;
            }
        }
        loss
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn get_layer_output_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.weights.0.shape()[0]).collect()
    }

    #[must_use]
    pub fn dims(&self) -> DataDims {
        self.dims
    }

    fn check_input(&self, batch: &BatchView<'_>) -> Result<()> {
        let (_, h, w, c) = batch.dim();
        if DataDims::new(h, w, c) != self.dims {
            return Err(Error::InvalidShape(format!(
                "{} expects {} samples, got {h}x{w}x{c}",
                self.name, self.dims
            )));
        }
        Ok(())
    }
}

fn relu(mut z: Array1<Float>) -> Array1<Float> {
    #[cfg(not(feature = "rayon"))]
    {
        z.mapv_inplace(|v| v.max(0.));
    }
    #[cfg(feature = "rayon")]
    {
        z.par_mapv_inplace(|v| v.max(0.));
    }
    z
}

impl Network for DenseAutoencoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&mut self, noisy: BatchView<'_>, clean: BatchView<'_>) -> Result<Float> {
        self.check_input(&noisy)?;
        if noisy.shape() != clean.shape() {
            return Err(Error::InvalidShape(format!(
                "noisy batch {:?} and clean batch {:?} differ",
                noisy.shape(),
                clean.shape()
            )));
        }
        let n = noisy.len_of(Axis(0));
        if n == 0 {
            return Ok(0.);
        }

        let mut total = 0.;
        for (input, target) in noisy.outer_iter().zip(clean.outer_iter()) {
            let input = input.iter().copied().collect::<Array1<Float>>();
            let target = target.iter().copied().collect::<Array1<Float>>();
            total += self.sgd_step(&input, &target);
        }
        Ok(total / n as Float)
    }

    fn test(&mut self, noisy: BatchView<'_>) -> Result<Batch> {
        self.check_input(&noisy)?;
        let mut out = Batch::zeros(noisy.raw_dim());
        for (input, mut slot) in noisy.outer_iter().zip(out.outer_iter_mut()) {
            let y = self.run(&input.iter().copied().collect());
            slot.iter_mut().zip(y.iter()).for_each(|(o, &v)| *o = v);
        }
        Ok(out)
    }

    fn visualize(&mut self, step: usize) -> Result<()> {
        for (j, layer) in self.layers.iter().enumerate() {
            let (out_dim, in_dim) = layer.weights.0.dim();
            let mean_abs = layer.weights.0.mapv(Float::abs).mean().unwrap_or(0.);
            info!(
                network = %self.name,
                step,
                layer = j,
                shape = %format!("{out_dim}x{in_dim}"),
                mean_abs_weight = mean_abs,
                "layer weights"
            );
        }
        Ok(())
    }
}

impl Layer {
    fn new_random<R: Rng + ?Sized>(
        num_inputs: usize,
        num_outputs: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self {
            weights: Weights::new_random(num_inputs, num_outputs, rng)?,
            biases: Biases::zeros(num_outputs),
        })
    }
}
impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CStructLayer {
            weights: Weights,
            biases: Biases,
        }

        let CStructLayer { weights, biases } = CStructLayer::deserialize(deserializer)?;
        if weights.0.nrows() != biases.0.len() {
            return Err(serde::de::Error::custom(format!(
                "layer has {} weight rows but {} biases",
                weights.0.nrows(),
                biases.0.len()
            )));
        }
        Ok(Self { weights, biases })
    }
}
impl Weights {
    /// He initialisation.
    fn new_random<R: Rng + ?Sized>(
        num_inputs: usize,
        num_outputs: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let two = 2.0;
        let n_inputs = num_inputs as Float;
        let stddev = (two / n_inputs).sqrt();
        let normal = Normal::new(0., stddev).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Self(Array2::random_using(
            (num_outputs, num_inputs),
            normal,
            rng,
        )))
    }
}
impl Biases {
    fn zeros(shape: usize) -> Self {
        Self(Array1::zeros(shape))
    }
}
