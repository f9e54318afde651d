//! Image-space filters applied to an accumulated frame.

use crate::Color;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zephyr_math::Vec3;

/// Post-process filter applied before display conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcess {
    /// Pass the accumulated color through unchanged
    #[default]
    None,
    /// Mean over a square window
    BoxBlur,
    /// Per-channel median over a square window
    Median,
    /// Grayscale view of the last pass depth, nearer is brighter
    Depth,
    /// Last pass normals mapped from [-1, 1] to [0, 1]
    Normals,
}

impl PostProcess {
    pub const ALL: [PostProcess; 5] = [
        PostProcess::None,
        PostProcess::BoxBlur,
        PostProcess::Median,
        PostProcess::Depth,
        PostProcess::Normals,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PostProcess::None => "none",
            PostProcess::BoxBlur => "box_blur",
            PostProcess::Median => "median",
            PostProcess::Depth => "depth",
            PostProcess::Normals => "normals",
        }
    }
}

impl fmt::Display for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PostProcess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        PostProcess::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown post-process mode '{s}' (expected one of: none, box_blur, median, depth, normals)"
                )
            })
    }
}

/// Read-only view of the per-pixel buffers a filter draws from.
#[derive(Debug, Clone, Copy)]
pub struct FrameChannels<'a> {
    pub width: usize,
    pub height: usize,
    pub color: &'a [Color],
    pub normal: &'a [Vec3],
    pub depth: &'a [f32],
}

/// Run `mode` over `input`, writing one color per pixel into `out`.
///
/// Rows are filtered in parallel on the current rayon pool. `out` must have
/// `width * height` entries, like every channel of `input`.
pub fn apply(mode: PostProcess, radius: usize, input: FrameChannels<'_>, out: &mut [Color]) {
    let width = input.width;
    if width == 0 || out.is_empty() {
        return;
    }
    debug_assert_eq!(out.len(), input.width * input.height);
    // A window wider than the image covers the same pixels as one that just fits
    let radius = radius.min(width.max(input.height));

    match mode {
        PostProcess::None => out.copy_from_slice(input.color),
        PostProcess::Depth => {
            out.par_iter_mut()
                .zip(input.depth.par_iter())
                .for_each(|(pixel, &depth)| *pixel = Color::splat(depth_shade(depth)));
        }
        PostProcess::Normals => {
            out.par_iter_mut()
                .zip(input.normal.par_iter())
                .for_each(|(pixel, &normal)| *pixel = (normal + Vec3::ONE) * 0.5);
        }
        PostProcess::BoxBlur => {
            out.par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = box_mean(&input, x, y, radius);
                    }
                });
        }
        PostProcess::Median => {
            out.par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    let span = |len: usize| (2 * radius + 1).min(len);
                    let mut window = Vec::with_capacity(span(width) * span(input.height));
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = window_median(&input, x, y, radius, &mut window);
                    }
                });
        }
    }
}

/// Maps depth in [0, inf] to brightness in [0, 1]; misses are black.
#[inline]
fn depth_shade(depth: f32) -> f32 {
    if depth.is_finite() && depth >= 0.0 {
        1.0 / (1.0 + depth)
    } else {
        0.0
    }
}

/// Inclusive window bounds clamped to the image.
#[inline]
fn window(center: usize, radius: usize, len: usize) -> (usize, usize) {
    (center.saturating_sub(radius), center.saturating_add(radius).min(len - 1))
}

fn box_mean(input: &FrameChannels<'_>, x: usize, y: usize, radius: usize) -> Color {
    let (x0, x1) = window(x, radius, input.width);
    let (y0, y1) = window(y, radius, input.height);

    let mut sum = Color::ZERO;
    for wy in y0..=y1 {
        let row = &input.color[wy * input.width..(wy + 1) * input.width];
        sum += row[x0..=x1].iter().copied().sum::<Color>();
    }
    sum / ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32
}

fn window_median(
    input: &FrameChannels<'_>,
    x: usize,
    y: usize,
    radius: usize,
    scratch: &mut Vec<f32>,
) -> Color {
    let (x0, x1) = window(x, radius, input.width);
    let (y0, y1) = window(y, radius, input.height);

    let mut channel = |c: usize| {
        scratch.clear();
        for wy in y0..=y1 {
            for wx in x0..=x1 {
                scratch.push(input.color[wy * input.width + wx][c]);
            }
        }
        let mid = scratch.len() / 2;
        *scratch.select_nth_unstable_by(mid, f32::total_cmp).1
    };

    Color::new(channel(0), channel(1), channel(2))
}
