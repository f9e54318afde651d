//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Emission from light materials
//! - Gamma correction with a configurable exponent
//! - Anti-aliasing via multi-sampling

use crate::{Camera, Color, HitRecord, Hittable, RenderConfig};
use rand::RngCore;
use zephyr_math::{Interval, Ray, Vec3};

/// Smallest accepted hit distance; avoids self-intersection after a bounce.
const T_MIN: f32 = 0.001;

/// Compute the color seen by a ray.
///
/// This is the core path tracing function. It traces the ray through
/// the scene, bouncing off surfaces and accumulating color.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    background: Color,
    rng: &mut dyn RngCore,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();
    if !world.hit(ray, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
        return background;
    }

    let emission = rec.material.emitted(rec.u, rec.v, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            let scattered_color = ray_color(&result.scattered, world, depth - 1, background, rng);
            emission + result.attenuation * scattered_color
        }
        None => emission,
    }
}

/// Everything one pass records for a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Mean radiance over the pass's samples
    pub color: Color,
    /// Surface normal at the primary hit, zero on a miss
    pub normal: Vec3,
    /// Distance from the camera to the primary hit, infinite on a miss
    pub depth: f32,
}

impl Default for PixelSample {
    fn default() -> Self {
        Self {
            color: Color::ZERO,
            normal: Vec3::ZERO,
            depth: f32::INFINITY,
        }
    }
}

/// Render a single pixel with multi-sampling.
///
/// Normal and depth come from the primary hit of the first sample.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> PixelSample {
    let samples = config.samples_per_pixel.max(1);
    let mut sample = PixelSample::default();

    for n in 0..samples {
        let ray = camera.get_ray(x, y, rng);

        if n == 0 {
            let mut rec = HitRecord::default();
            if world.hit(&ray, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
                sample.normal = rec.normal;
                sample.depth = rec.t * ray.direction().length();
            }
        }

        sample.color += ray_color(&ray, world, config.max_depth, config.background, rng);
    }

    sample.color /= samples as f32;
    sample
}

/// Apply gamma correction, mapping linear radiance to display space.
#[inline]
pub fn linear_to_gamma(linear: f32, gamma: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / gamma)
    } else {
        0.0
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color, gamma: f32) -> [u8; 4] {
    let channel = |c: f32| (255.0 * clamp_01(linear_to_gamma(c, gamma))) as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}
