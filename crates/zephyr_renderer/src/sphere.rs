//! Sphere primitive for ray tracing.

use crate::{
    hittable::{HitRecord, Hittable},
    Material,
};
use std::f32::consts::PI;
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray, Vec3};

/// A sphere primitive.
pub struct Sphere<M: Material> {
    center: Vec3,
    radius: f32,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Sphere<M> {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: M) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// UV coordinates for a point on the unit sphere centered at the origin.
    fn unit_sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from +Y, phi: angle around Y axis from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl<M: Material + 'static> Hittable for Sphere<M> {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return false;
            }
        }

        rec.t = root;
        rec.p = ray.at(rec.t);
        let outward_normal = (rec.p - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = self.surface_coords(rec.p);
        rec.material = &self.material;

        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn surface_coords(&self, point: Vec3) -> (f32, f32) {
        Self::unit_sphere_uv((point - self.center) / self.radius)
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        self
    }
}
