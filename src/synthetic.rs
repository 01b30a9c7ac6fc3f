use ndarray::{Array3, Axis, s};
use ndarray_rand::rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    dataset::{DataDims, Dataset},
    error::{Error, Result},
    types::{Batch, Float},
};

/// Mixed into the seed so the test stream never replays the training stream.
const TEST_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const MAX_BARS: usize = 3;

/// Black images crossed by one to three white horizontal or vertical bars.
///
/// Values are exactly 0 or 1 in every channel, so the range is `(0, 1)`.
#[derive(Debug, Clone)]
pub struct BarsDataset {
    dims: DataDims,
    train_rng: StdRng,
    test_rng: StdRng,
}

impl BarsDataset {
    pub fn new(dims: DataDims, seed: u64) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::InvalidShape(format!("cannot draw bars on {dims} images")));
        }
        Ok(Self {
            dims,
            train_rng: StdRng::seed_from_u64(seed),
            test_rng: StdRng::seed_from_u64(seed ^ TEST_STREAM),
        })
    }

    fn draw<R: Rng + ?Sized>(dims: DataDims, n: usize, rng: &mut R) -> Batch {
        let mut batch = Batch::zeros(dims.batch_shape(n));
        for mut sample in batch.axis_iter_mut(Axis(0)) {
            draw_bars(&mut sample, dims, rng);
        }
        batch
    }
}

fn draw_bars<R: Rng + ?Sized>(
    sample: &mut ndarray::ArrayViewMut3<'_, Float>,
    dims: DataDims,
    rng: &mut R,
) {
    let bars = rng.gen_range(1..=MAX_BARS);
    for _ in 0..bars {
        let horizontal = rng.gen_bool(0.5);
        let extent = if horizontal { dims.height } else { dims.width };
        let thickness = rng.gen_range(1..=(extent / 8).max(1));
        let start = rng.gen_range(0..=extent - thickness);
        if horizontal {
            sample.slice_mut(s![start..start + thickness, .., ..]).fill(1.);
        } else {
            sample.slice_mut(s![.., start..start + thickness, ..]).fill(1.);
        }
    }
}

impl Dataset for BarsDataset {
    fn data_dims(&self) -> DataDims {
        self.dims
    }

    fn range(&self) -> (Float, Float) {
        (0., 1.)
    }

    fn next_batch(&mut self, n: usize) -> Result<Batch> {
        Ok(Self::draw(self.dims, n, &mut self.train_rng))
    }

    fn next_test_batch(&mut self, n: usize) -> Result<Batch> {
        Ok(Self::draw(self.dims, n, &mut self.test_rng))
    }
}

/// Convenience for tests and demos: a single sample with one horizontal bar at `row`.
#[must_use]
pub fn horizontal_bar(dims: DataDims, row: usize) -> Array3<Float> {
    let mut sample = Array3::zeros((dims.height, dims.width, dims.channels));
    if row < dims.height {
        sample.slice_mut(s![row..=row, .., ..]).fill(1.);
    }
    sample
}
