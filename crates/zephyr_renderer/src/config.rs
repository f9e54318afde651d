//! Render configuration and the process-wide render context.

use crate::{Color, PostProcess, RenderError, RenderResult};
use serde::{Deserialize, Serialize};

/// Render configuration.
///
/// Each render task receives its own copy for the duration of a pass, so
/// changing the configuration between passes never affects a pass in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Samples per pixel for each pass
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Number of render workers
    pub threads: usize,
    /// Display gamma used for the RGBA conversion
    pub gamma: f32,
    /// Filter applied to the accumulated image while the camera is still
    pub postproc: PostProcess,
    /// Filter applied to each freshly rendered pass; never fed into the average
    pub pass_postproc: PostProcess,
    /// Kernel radius of both post-process filters, in pixels
    pub postproc_radius: usize,
    /// Background color when ray doesn't hit anything
    pub background: Color,
    /// Base seed for the per-task random generators; random when unset
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            samples_per_pixel: 4,
            max_depth: 8,
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            gamma: 2.2,
            postproc: PostProcess::None,
            pass_postproc: PostProcess::None,
            postproc_radius: 1,
            background: Color::ZERO,
            seed: None,
        }
    }
}

impl RenderConfig {
    /// Reject configurations no pass could be rendered with.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.threads == 0 {
            return Err(RenderError::InvalidConfig("threads must be at least 1".into()));
        }
        if self.gamma.is_nan() || self.gamma <= 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}

/// Process-scoped state created once at startup and passed explicitly to
/// whatever needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    seed: u64,
}

impl RenderContext {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Use the configured seed, or draw one from the OS entropy source.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.seed.unwrap_or_else(rand::random))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for one worker's generator in one pass.
    ///
    /// Distinct for every (pass, worker) pair so passes add new samples
    /// instead of repeating the previous ones.
    pub fn task_seed(&self, pass: u64, worker: usize) -> u64 {
        // splitmix64 finalizer over the combined inputs
        let mut z = self
            .seed
            .wrapping_add(pass.wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add((worker as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}
