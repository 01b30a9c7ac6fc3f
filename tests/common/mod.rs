#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use denoising_trainer::{
    Batch, BatchView, DataDims, Dataset, Error, Float, ImageView, Network, Result, Viewer,
};

#[derive(Debug, Clone, Copy)]
pub enum Reconstruction {
    Identity,
    Constant(Float),
}

/// Records every call the trainer makes.
#[derive(Debug)]
pub struct MockNetwork {
    pub name: String,
    pub recon: Reconstruction,
    pub visualize_steps: Vec<usize>,
    pub train_calls: usize,
    pub test_calls: usize,
    pub last_noisy: Option<Batch>,
    pub fail_train_at: Option<usize>,
}

impl MockNetwork {
    pub fn new(recon: Reconstruction) -> Self {
        Self {
            name: "mock".to_owned(),
            recon,
            visualize_steps: vec![],
            train_calls: 0,
            test_calls: 0,
            last_noisy: None,
            fail_train_at: None,
        }
    }
}

impl Network for MockNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&mut self, noisy: BatchView<'_>, clean: BatchView<'_>) -> Result<Float> {
        if self.fail_train_at == Some(self.train_calls) {
            return Err(Error::Collaborator("network diverged".into()));
        }
        self.train_calls += 1;
        self.last_noisy = Some(noisy.to_owned());
        Ok((&noisy - &clean).mapv(|d| d * d).mean().unwrap_or(0.))
    }

    fn test(&mut self, noisy: BatchView<'_>) -> Result<Batch> {
        self.test_calls += 1;
        Ok(match self.recon {
            Reconstruction::Identity => noisy.to_owned(),
            Reconstruction::Constant(v) => Batch::from_elem(noisy.raw_dim(), v),
        })
    }

    fn visualize(&mut self, step: usize) -> Result<()> {
        self.visualize_steps.push(step);
        Ok(())
    }
}

/// Constant training batches; test batches cycle through `test_values`.
#[derive(Debug)]
pub struct ScriptedDataset {
    pub dims: DataDims,
    pub range: (Float, Float),
    pub train_value: Float,
    pub test_values: Vec<Float>,
    pub train_calls: usize,
    pub test_calls: usize,
    /// Hand out batches of this many samples regardless of the request.
    pub wrong_batch_len: Option<usize>,
}

impl ScriptedDataset {
    pub fn new(dims: DataDims) -> Self {
        Self {
            dims,
            range: (0., 1.),
            train_value: 0.5,
            test_values: vec![0.],
            train_calls: 0,
            test_calls: 0,
            wrong_batch_len: None,
        }
    }
}

impl Dataset for ScriptedDataset {
    fn data_dims(&self) -> DataDims {
        self.dims
    }

    fn range(&self) -> (Float, Float) {
        self.range
    }

    fn next_batch(&mut self, n: usize) -> Result<Batch> {
        self.train_calls += 1;
        let n = self.wrong_batch_len.unwrap_or(n);
        Ok(Batch::from_elem(self.dims.batch_shape(n), self.train_value))
    }

    fn next_test_batch(&mut self, n: usize) -> Result<Batch> {
        let value = self.test_values[self.test_calls % self.test_values.len()];
        self.test_calls += 1;
        Ok(Batch::from_elem(self.dims.batch_shape(n), value))
    }
}

/// Shares what it was shown with the test through an `Rc`.
#[derive(Debug, Clone, Default)]
pub struct RecordingViewer {
    pub shown: Rc<RefCell<Vec<(String, (usize, usize, usize))>>>,
}

impl Viewer for RecordingViewer {
    fn show(&mut self, title: &str, canvas: ImageView<'_>) -> Result<()> {
        self.shown.borrow_mut().push((title.to_owned(), canvas.dim()));
        Ok(())
    }
}
