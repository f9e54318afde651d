//! Progressive accumulation of render passes.

use crate::{Frame, PostProcess, RenderConfig, RenderResult};

/// Folds each freshly rendered pass into a persistent frame.
///
/// Color converges as the running mean of all passes since the last reset.
/// Normal and depth always show the latest pass. While the camera moves,
/// every pass replaces the image outright and is shown through the depth
/// filter; once it stops, the previous filter comes back and averaging
/// starts over.
#[derive(Debug, Clone)]
pub struct Accumulator {
    passes: u32,
    postproc: PostProcess,
    preserved: PostProcess,
    radius: usize,
    moving: bool,
}

impl Accumulator {
    pub fn new(postproc: PostProcess, radius: usize) -> Self {
        Self {
            passes: 0,
            postproc,
            preserved: postproc,
            radius,
            moving: false,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.postproc, config.postproc_radius)
    }

    /// Passes folded into the current average.
    pub fn pass_count(&self) -> u32 {
        self.passes
    }

    /// Filter applied to the next accumulated frame.
    pub fn postproc(&self) -> PostProcess {
        self.postproc
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Discard the running average; the next pass is copied as is.
    pub fn reset(&mut self) {
        self.passes = 0;
    }

    /// Change the still-camera filter. While moving, the change takes effect
    /// once the camera stops.
    pub fn set_postproc(&mut self, mode: PostProcess) {
        if self.moving {
            self.preserved = mode;
        } else {
            self.postproc = mode;
        }
    }

    /// Enter or leave the moving state. Both transitions reset the average.
    pub fn set_moving(&mut self, moving: bool) {
        if moving == self.moving {
            if moving {
                self.passes = 0;
            }
            return;
        }

        if moving {
            self.preserved = self.postproc;
            self.postproc = PostProcess::Depth;
            log::trace!("Camera moving, showing {} preview", self.postproc);
        } else {
            self.postproc = self.preserved;
            log::trace!("Camera settled, restoring {} filter", self.postproc);
        }
        self.moving = moving;
        self.passes = 0;
    }

    /// Fold `fresh` into `current` and refresh its filtered output.
    pub fn accumulate(&mut self, current: &mut Frame, fresh: &Frame) -> RenderResult<()> {
        current.copy_geometry_from(fresh)?;

        if self.moving {
            self.passes = 0;
        }

        if self.passes == 0 {
            current.color_mut().copy_from_slice(fresh.color());
        } else {
            // stored + (new - stored) / n equals stored * (n-1)/n + new / n
            // and leaves a constant color exactly unchanged
            let inv_n = 1.0 / (self.passes + 1) as f32;
            for (stored, &new) in current.color_mut().iter_mut().zip(fresh.color()) {
                *stored += (new - *stored) * inv_n;
            }
        }
        self.passes += 1;

        current.postprocess(self.postproc, self.radius);
        Ok(())
    }
}
