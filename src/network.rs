use crate::{
    error::Result,
    types::{Batch, BatchView, Float},
};

/// The model being trained. The trainer only drives it; how it learns is its own business.
pub trait Network {
    /// Names the output folder `<output_root>/<name>/reconstruction`.
    fn name(&self) -> &str;

    /// One optimisation step on `noisy` inputs towards `clean` targets. Returns the step loss.
    fn train(&mut self, noisy: BatchView<'_>, clean: BatchView<'_>) -> Result<Float>;

    /// Reconstructs `noisy`. The result must have the same shape as the input.
    fn test(&mut self, noisy: BatchView<'_>) -> Result<Batch>;

    /// Periodic hook, called with `iteration / visualize_every`.
    fn visualize(&mut self, step: usize) -> Result<()>;
}
