//! Transform instances wrapping another hittable.
//!
//! Rays are moved into the wrapped object's space, tested there, and the
//! hit is moved back. The wrapped object is shared, so one prototype can be
//! placed several times.

use crate::hittable::{HitRecord, Hittable};
use std::fmt;
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray, Vec3};

/// Rotation about the Y axis.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    sin_theta: f32,
    cos_theta: f32,
    bbox: Option<Aabb>,
}

impl RotateY {
    /// Rotate `object` by `degrees` around the world Y axis.
    pub fn new(object: Arc<dyn Hittable>, degrees: f32) -> Self {
        let (sin_theta, cos_theta) = degrees.to_radians().sin_cos();
        Self::from_parts(object, sin_theta, cos_theta)
    }

    fn from_parts(object: Arc<dyn Hittable>, sin_theta: f32, cos_theta: f32) -> Self {
        let mut rotated = Self {
            object,
            sin_theta,
            cos_theta,
            bbox: None,
        };
        rotated.bbox = rotated.object.bounding_box().map(|b| rotated.rotated_bounds(&b));
        rotated
    }

    /// World to object space.
    #[inline]
    fn to_object(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * p.x - self.sin_theta * p.z,
            p.y,
            self.sin_theta * p.x + self.cos_theta * p.z,
        )
    }

    /// Object to world space.
    #[inline]
    fn to_world(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * p.x + self.sin_theta * p.z,
            p.y,
            -self.sin_theta * p.x + self.cos_theta * p.z,
        )
    }

    /// Bounds of the eight rotated corners of `b`.
    fn rotated_bounds(&self, b: &Aabb) -> Aabb {
        let mut out = Aabb::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { b.min.x } else { b.max.x },
                if i & 2 == 0 { b.min.y } else { b.max.y },
                if i & 4 == 0 { b.min.z } else { b.max.z },
            );
            let c = self.to_world(corner);
            out = out.union(&Aabb::new(c, c));
        }
        out
    }
}

impl Hittable for RotateY {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let local = Ray::new(self.to_object(ray.origin()), self.to_object(ray.direction()));

        if !self.object.hit(&local, ray_t, rec) {
            return false;
        }

        rec.p = self.to_world(rec.p);
        rec.normal = self.to_world(rec.normal);
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        self.bbox
    }

    fn surface_coords(&self, point: Vec3) -> (f32, f32) {
        self.object.surface_coords(self.to_object(point))
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        let inner = Arc::clone(&self.object).to_leaf();
        Arc::new(RotateY::from_parts(inner, self.sin_theta, self.cos_theta))
    }

    fn write_tree(&self, depth: usize, out: &mut dyn fmt::Write) -> fmt::Result {
        self.object.write_tree(depth, out)
    }
}

/// Translation by a fixed offset.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
    bbox: Option<Aabb>,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        let bbox = object
            .bounding_box()
            .map(|b| Aabb::new(b.min + offset, b.max + offset));
        Self {
            object,
            offset,
            bbox,
        }
    }
}

impl Hittable for Translate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let local = Ray::new(ray.origin() - self.offset, ray.direction());

        if !self.object.hit(&local, ray_t, rec) {
            return false;
        }

        rec.p += self.offset;
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        self.bbox
    }

    fn surface_coords(&self, point: Vec3) -> (f32, f32) {
        self.object.surface_coords(point - self.offset)
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        let inner = Arc::clone(&self.object).to_leaf();
        Arc::new(Translate::new(inner, self.offset))
    }

    fn write_tree(&self, depth: usize, out: &mut dyn fmt::Write) -> fmt::Result {
        self.object.write_tree(depth, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cuboid, Lambertian, Sphere};

    #[test]
    fn test_rotate_y_bounds() {
        let cube: Arc<dyn Hittable> = Arc::new(cuboid(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Lambertian::new(Vec3::ONE),
        ));
        let rotated = RotateY::new(cube, 45.0);
        let bbox = rotated.bounding_box().unwrap();

        let half_diagonal = 2.0f32.sqrt();
        assert!((bbox.max.x - half_diagonal).abs() < 1e-5);
        assert!((bbox.min.z + half_diagonal).abs() < 1e-5);
        assert_eq!(bbox.min.y, 0.0);
        assert_eq!(bbox.max.y, 1.0);
    }

    #[test]
    fn test_rotate_y_hit_moves_point_back() {
        let sphere: Arc<dyn Hittable> = Arc::new(Sphere::new(
            Vec3::new(3.0, 0.0, 0.0),
            1.0,
            Lambertian::new(Vec3::ONE),
        ));
        // +90 degrees takes +X to -Z
        let rotated = RotateY::new(sphere, 90.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(rotated.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 2.0).abs() < 1e-4);
        assert!((rec.p - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
        assert!((rec.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_translate_hit_and_bounds() {
        let sphere: Arc<dyn Hittable> =
            Arc::new(Sphere::new(Vec3::ZERO, 1.0, Lambertian::new(Vec3::ONE)));
        let moved = Translate::new(sphere, Vec3::new(0.0, 0.0, -5.0));

        let bbox = moved.bounding_box().unwrap();
        assert_eq!(bbox.min.z, -6.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(moved.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.p.z + 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_instance_to_leaf_accelerates_inner_list() {
        let cube: Arc<dyn Hittable> = Arc::new(cuboid(
            Vec3::ZERO,
            Vec3::ONE,
            Lambertian::new(Vec3::ONE),
        ));
        let leaf = Arc::new(RotateY::new(cube, 15.0)).to_leaf();

        let mut tree = String::new();
        leaf.write_tree(0, &mut tree).unwrap();
        assert!(tree.starts_with("node {"));
    }
}
