//! Zephyr - progressive CPU path tracing
//!
//! A Monte Carlo path tracer that refines an image pass by pass.
//! Scenes are accelerated with a BVH, each pass is split into row bands
//! rendered on a fixed worker pool, and passes are averaged into a
//! persistent frame that is filtered and gamma corrected for display.

mod accumulator;
mod bvh;
mod camera;
mod config;
mod error;
mod frame;
mod hittable;
mod hittable_list;
mod instance;
mod material;
mod postproc;
mod progressive;
mod quad;
mod renderer;
mod scene;
mod sphere;
mod task;
mod threader;

pub use accumulator::Accumulator;
pub use bvh::{BvhChild, BvhNode, BvhStats};
pub use camera::Camera;
pub use config::{RenderConfig, RenderContext};
pub use error::{BvhError, RenderError, RenderResult};
pub use frame::{Frame, FrameBand};
pub use hittable::{HitRecord, Hittable};
pub use hittable_list::HittableList;
pub use instance::{RotateY, Translate};
pub use material::{Color, DiffuseLight, Lambertian, Material, Metal, ScatterResult};
pub use postproc::{apply as apply_postprocess, FrameChannels, PostProcess};
pub use progressive::ProgressiveRenderer;
pub use quad::{cuboid, Quad};
pub use renderer::{color_to_rgba, linear_to_gamma, ray_color, render_pixel, PixelSample};
pub use scene::Scene;
pub use sphere::Sphere;
pub use task::{partition_rows, PixelRect, RenderTask};
pub use threader::Threader;

/// Re-export Vec3 and common math types from zephyr_math
pub use zephyr_math::{Aabb, Interval, Ray, Vec3};
