use std::io::{self, Stdout, Write};

use ndarray::{Axis, s};

use crate::{
    error::Result,
    types::{Float, ImageView},
};

/// An on-screen surface the trainer redraws after every reconstruction snapshot.
pub trait Viewer {
    fn show(&mut self, title: &str, canvas: ImageView<'_>) -> Result<()>;
}

/// Dark to bright.
const RAMP: &[u8] = b" .:-=+*#%@";

/// Draws canvases as ASCII art, one character per sampled pixel.
pub struct TerminalViewer<W: Write = Stdout> {
    out: W,
    columns: usize,
}

impl TerminalViewer<Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), 80)
    }
}

impl<W: Write> TerminalViewer<W> {
    /// `columns` caps the drawing width; wider canvases are downsampled.
    pub fn new(out: W, columns: usize) -> Self {
        Self {
            out,
            columns: columns.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Viewer for TerminalViewer<W> {
    fn show(&mut self, title: &str, canvas: ImageView<'_>) -> Result<()> {
        let (_, width, _) = canvas.dim();
        // terminal cells are roughly twice as tall as wide
        let step_x = width.div_ceil(self.columns).max(1);
        let step_y = 2 * step_x;

        let luminance = canvas.mean_axis(Axis(2));
        let (lo, hi) = canvas
            .iter()
            .fold((Float::INFINITY, Float::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = if hi > lo { hi - lo } else { 1. };

        writeln!(self.out, "{title}")?;
        if let Some(luminance) = luminance {
            let sampled = luminance.slice(s![..;step_y, ..;step_x]);
            for row in sampled.rows() {
                let line: String = row
                    .iter()
                    .map(|&v| {
                        let level = ((v - lo) / span * (RAMP.len() - 1) as Float).round();
                        RAMP[(level.max(0.) as usize).min(RAMP.len() - 1)] as char
                    })
                    .collect();
                writeln!(self.out, "{}", line.trim_end())?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
