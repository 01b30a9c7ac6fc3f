use ndarray::{Array4, Zip, s};
use ndarray_rand::{
    RandomExt,
    rand::Rng,
    rand_distr::{Bernoulli, Distribution, Normal, StandardNormal},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{Batch, BatchView, Float},
};

/// Smallest side of an occlusion window, in pixels.
const MIN_OCCLUSION: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Probability an element is zeroed (pepper).
    pub drop_prob: f64,
    /// Probability 1.0 is added to an element (salt).
    pub salt_prob: f64,
    /// Stddev of the additive Gaussian noise.
    pub gaussian_std: Float,
    /// Blank out one random window per batch with all zeros or all ones.
    pub occlusion: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            drop_prob: 0.1,
            salt_prob: 0.1,
            gaussian_std: 0.1,
            occlusion: false,
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [("drop_prob", self.drop_prob), ("salt_prob", self.salt_prob)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if !(self.gaussian_std.is_finite() && self.gaussian_std >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "gaussian_std must be finite and >= 0, got {}",
                self.gaussian_std
            )));
        }
        Ok(())
    }
}

/// Salt-and-pepper corruption, then Gaussian noise, then the optional occlusion window,
/// then a clamp to `range`.
///
/// Every random draw comes from `rng`, so a seeded RNG reproduces the corruption exactly.
pub fn corrupt<R>(
    batch: BatchView<'_>,
    range: (Float, Float),
    cfg: &NoiseConfig,
    rng: &mut R,
) -> Result<Batch>
where
    R: Rng + ?Sized,
    StandardNormal: Distribution<Float>,
{
    cfg.validate()?;
    let (lo, hi) = range;
    if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
        return Err(Error::InvalidConfig(format!(
            "dataset range must be finite with min <= max, got ({lo}, {hi})"
        )));
    }

    let shape = batch.raw_dim();
    let keep = Array4::random_using(shape, bernoulli(1.0 - cfg.drop_prob)?, rng);
    let salt = Array4::random_using(shape, bernoulli(cfg.salt_prob)?, rng);
    let normal =
        Normal::new(0., cfg.gaussian_std).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let gaussian = Array4::random_using(shape, normal, rng);

    let mut out = batch.to_owned();
    let zip = Zip::from(&mut out).and(&keep).and(&salt).and(&gaussian);
    let for_each_closure = |o: &mut Float, &k: &bool, &s: &bool, &g: &Float| {
        let kept = if k { *o } else { 0. };
        let salted = if s { kept + 1. } else { kept };
        *o = salted + g;
    };

    #[cfg(not(feature = "rayon"))]
    {
        zip.for_each(for_each_closure);
    }
    #[cfg(feature = "rayon")]
    {
        zip.par_for_each(for_each_closure);
    }

    if cfg.occlusion {
        occlude(&mut out, rng);
    }

    #[cfg(not(feature = "rayon"))]
    {
        out.mapv_inplace(|x| x.max(lo).min(hi));
    }
    #[cfg(feature = "rayon")]
    {
        out.par_mapv_inplace(|x| x.max(lo).min(hi));
    }

    Ok(out)
}

fn bernoulli(p: f64) -> Result<Bernoulli> {
    Bernoulli::new(p).map_err(|e| Error::InvalidConfig(e.to_string()))
}

/// Fills one window, shared by every sample and channel of the batch, with 0 or 1.
/// Images whose sides are too short for a [`MIN_OCCLUSION`] window are left alone.
fn occlude<R: Rng + ?Sized>(out: &mut Batch, rng: &mut R) {
    let (_, height, width, _) = out.dim();
    let max_h = (height as f64 / 1.5).round() as usize;
    let max_w = (width as f64 / 1.5).round() as usize;
    if max_h < MIN_OCCLUSION || max_w < MIN_OCCLUSION {
        tracing::debug!(height, width, "image too small for occlusion window");
        return;
    }

    let h = rng.gen_range(MIN_OCCLUSION..=max_h);
    let w = rng.gen_range(MIN_OCCLUSION..=max_w);
    let top = rng.gen_range(0..=height - h - 1);
    let left = rng.gen_range(0..=width - w - 1);
    let fill = if rng.gen_bool(0.5) { 0. } else { 1. };

    out.slice_mut(s![.., top..top + h, left..left + w, ..]).fill(fill);
}
