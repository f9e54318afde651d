//! Row-band render tasks.
//!
//! The image is divided into horizontal bands, one per worker, that are
//! rendered independently and in parallel.

use crate::renderer::render_pixel;
use crate::{FrameBand, RenderConfig, Scene};
use rand::RngCore;

/// Half-open pixel rectangle `[min_x, max_x) x [min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl PixelRect {
    /// Rows `[min_y, max_y)` across the full `width`.
    pub fn rows(width: u32, min_y: u32, max_y: u32) -> Self {
        Self {
            min_x: 0,
            max_x: width,
            min_y,
            max_y,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Get the total number of pixels in this rectangle.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_y..self.max_y).contains(&y)
    }
}

/// A rectangle of the image assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTask {
    pub rect: PixelRect,
    /// Index of the worker, also used to derive the task's random seed
    pub worker: usize,
}

impl RenderTask {
    pub fn new(rect: PixelRect, worker: usize) -> Self {
        Self { rect, worker }
    }

    /// Trace every pixel of the task's rectangle into `band`.
    ///
    /// Pixels are visited row by row, left to right.
    pub fn render(
        &self,
        scene: &Scene,
        config: &RenderConfig,
        band: &mut FrameBand<'_>,
        rng: &mut dyn RngCore,
    ) {
        for y in self.rect.min_y..self.rect.max_y {
            for x in self.rect.min_x..self.rect.max_x {
                let sample = render_pixel(&scene.camera, scene.world(), x, y, config, rng);
                band.set(x, y, sample);
            }
        }
    }
}

/// Split an image into one full-width row band per worker.
///
/// The first `workers - 1` bands get `height / workers` rows each and the
/// last band takes the remainder. `workers` is clamped to `1..=height` so no
/// band is ever empty.
pub fn partition_rows(width: u32, height: u32, workers: usize) -> Vec<RenderTask> {
    if height == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, height as usize) as u32;
    let rows = height / workers;

    (0..workers)
        .map(|i| {
            let min_y = i * rows;
            let max_y = if i + 1 == workers { height } else { min_y + rows };
            RenderTask::new(PixelRect::rows(width, min_y, max_y), i as usize)
        })
        .collect()
}
