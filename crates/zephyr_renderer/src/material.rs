//! Material trait for surface scattering.
//!
//! Only the minimal set needed for light transport: diffuse, metal and
//! emitters.

use crate::hittable::HitRecord;
use rand::{Rng, RngCore};
use zephyr_math::{Ray, Vec3};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Outcome of a scattering event.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray, or `None` if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult>;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scatter_direction),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Absorb rays fuzzed below the surface
        (scattered_dir.dot(rec.normal) > 0.0).then(|| ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scattered_dir),
        })
    }
}

/// Diffuse light emitter.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterResult> {
        None
    }

    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.emit
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Uniformly distributed unit vector, by rejection sampling.
fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
