//! Side-by-side original / noisy / reconstructed composites and their PNG snapshots.
//!
//! A canvas for `num_plot` samples of `H x W x C` images is `[num_plot * H, 3 * W + 20, C]`:
//! each row holds the original at columns `0..W`, the noisy input at `W + 10..2W + 10` and the
//! reconstruction at `2W + 20..3W + 20`. Gaps keep the background, which is black for
//! single-channel images and white otherwise.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage, RgbaImage};
use ndarray::{Array3, Axis, s};

use crate::{
    dataset::DataDims,
    error::{Error, Result},
    types::{BatchView, Float, Image, ImageView},
};

/// Columns between neighbouring tiles.
pub const GAP: usize = 10;

/// `(height, width, channels)` of the canvas for `num_plot` rows.
#[must_use]
pub const fn canvas_dim(dims: DataDims, num_plot: usize) -> (usize, usize, usize) {
    (
        num_plot * dims.height,
        3 * dims.width + 2 * GAP,
        dims.channels,
    )
}

/// Empty canvas filled with the background colour.
#[must_use]
pub fn blank_canvas(dims: DataDims, num_plot: usize) -> Image {
    let background = if dims.channels == 1 { 0. } else { 1. };
    Array3::from_elem(canvas_dim(dims, num_plot), background)
}

/// Lays out the first `num_plot` samples of each batch, passing every tile through `display`.
pub fn build_canvas<F>(
    dims: DataDims,
    test: BatchView<'_>,
    noisy: BatchView<'_>,
    reconstruction: BatchView<'_>,
    num_plot: usize,
    display: F,
) -> Result<Image>
where
    F: Fn(ImageView<'_>) -> Image,
{
    let sources = [
        ("test", test.view(), 0),
        ("noisy", noisy.view(), dims.width + GAP),
        ("reconstruction", reconstruction.view(), 2 * (dims.width + GAP)),
    ];
    for (label, batch, _) in &sources {
        let (n, h, w, c) = batch.dim();
        if (h, w, c) != (dims.height, dims.width, dims.channels) {
            return Err(Error::InvalidShape(format!(
                "{label} samples are {h}x{w}x{c}, expected {dims}"
            )));
        }
        if n < num_plot {
            return Err(Error::InvalidShape(format!(
                "{label} batch holds {n} samples, cannot plot {num_plot}"
            )));
        }
    }

    let mut canvas = blank_canvas(dims, num_plot);
    for row in 0..num_plot {
        let top = row * dims.height;
        for (label, batch, left) in &sources {
            let tile = display(batch.index_axis(Axis(0), row));
            if tile.dim() != (dims.height, dims.width, dims.channels) {
                return Err(Error::InvalidShape(format!(
                    "display turned a {label} sample into {:?}, expected {dims}",
                    tile.dim()
                )));
            }
            canvas
                .slice_mut(s![top..top + dims.height, *left..*left + dims.width, ..])
                .assign(&tile);
        }
    }
    Ok(canvas)
}

/// Linearly rescales the whole canvas from `[min, max]` onto `0..=255`, rounding half up.
/// A constant canvas maps to zeros.
#[must_use]
pub fn to_bytes(canvas: ImageView<'_>) -> Vec<u8> {
    let (min, max) = canvas
        .iter()
        .fold((Float::INFINITY, Float::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if max - min == 0. { 1. } else { max - min };
    let scale = 255. / span;
    canvas
        .iter()
        .map(|&v| ((v - min) * scale).clamp(0., 255.) + 0.5)
        .map(|v| v as u8)
        .collect()
}

/// Writes the canvas as an 8-bit PNG: grayscale for 1 channel, RGB for 3, RGBA for 4.
pub fn save_png(canvas: ImageView<'_>, path: &Path) -> Result<()> {
    let (h, w, c) = canvas.dim();
    let height = u32::try_from(h).map_err(|_| Error::InvalidShape(format!("height {h}")))?;
    let width = u32::try_from(w).map_err(|_| Error::InvalidShape(format!("width {w}")))?;
    let bytes = to_bytes(canvas);
    let mismatch = || Error::InvalidShape(format!("canvas buffer does not match {h}x{w}x{c}"));

    match c {
        1 => GrayImage::from_raw(width, height, bytes)
            .ok_or_else(mismatch)?
            .save(path)?,
        3 => RgbImage::from_raw(width, height, bytes)
            .ok_or_else(mismatch)?
            .save(path)?,
        4 => RgbaImage::from_raw(width, height, bytes)
            .ok_or_else(mismatch)?
            .save(path)?,
        other => {
            return Err(Error::InvalidShape(format!(
                "cannot encode a {other}-channel canvas"
            )));
        }
    }
    Ok(())
}

/// Saves `current.png` and `epoch<epoch>.png` into `dir`, creating it if needed.
/// Returns the path of the epoch snapshot.
pub fn write_snapshots(canvas: ImageView<'_>, dir: &Path, epoch: usize) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    save_png(canvas, &dir.join("current.png"))?;
    let snapshot = dir.join(format!("epoch{epoch}.png"));
    save_png(canvas, &snapshot)?;
    tracing::debug!(path = %snapshot.display(), "saved reconstruction");
    Ok(snapshot)
}
