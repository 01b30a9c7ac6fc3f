use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    types::{Batch, Float, Image, ImageView},
};

/// Per-sample dimensions, batch axis excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDims {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl DataDims {
    #[must_use]
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    #[must_use]
    pub const fn area(&self) -> usize {
        self.height * self.width
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a batch of `n` samples.
    #[must_use]
    pub const fn batch_shape(&self, n: usize) -> (usize, usize, usize, usize) {
        (n, self.height, self.width, self.channels)
    }
}

impl fmt::Display for DataDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Source of training and test batches.
pub trait Dataset {
    fn data_dims(&self) -> DataDims;

    /// Inclusive `(min, max)` bounds of every sample value.
    fn range(&self) -> (Float, Float);

    /// `n` training samples, shaped `[n, height, width, channels]`.
    fn next_batch(&mut self, n: usize) -> Result<Batch>;

    /// `n` held-out samples, shaped `[n, height, width, channels]`.
    fn next_test_batch(&mut self, n: usize) -> Result<Batch>;

    /// Maps a sample to something worth looking at (undo normalisation, colourise).
    fn display(&self, sample: ImageView<'_>) -> Image {
        sample.to_owned()
    }
}
