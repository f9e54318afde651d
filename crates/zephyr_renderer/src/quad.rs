//! Planar parallelogram primitive and axis-aligned boxes built from it.

use crate::{
    hittable::{HitRecord, Hittable},
    HittableList, Material,
};
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray, Vec3};

/// A parallelogram spanned by edges `u` and `v` from corner `q`.
///
/// Its bounding box is flat along the plane normal when the quad is axis
/// aligned, which the BVH handles without padding.
pub struct Quad<M: Material> {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// `n / (n . n)`, used to project hit points onto the edge basis
    w: Vec3,
    normal: Vec3,
    d: f32,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Quad<M> {
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: M) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let d = normal.dot(q);
        let w = n / n.dot(n);

        let corners = [q, q + u, q + v, q + u + v];
        let bbox = corners
            .iter()
            .fold(Aabb::EMPTY, |acc, &c| acc.union(&Aabb::new(c, c)));

        Self {
            q,
            u,
            v,
            w,
            normal,
            d,
            material,
            bbox,
        }
    }

    /// Edge-basis coordinates of a point in the quad's plane.
    fn planar_coords(&self, point: Vec3) -> (f32, f32) {
        let planar = point - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));
        (alpha, beta)
    }
}

impl<M: Material + 'static> Hittable for Quad<M> {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let denom = self.normal.dot(ray.direction());

        // Ray is parallel to the plane
        if denom.abs() < 1e-8 {
            return false;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.surrounds(t) {
            return false;
        }

        let p = ray.at(t);
        let (alpha, beta) = self.planar_coords(p);
        if !(0.0..=1.0).contains(&alpha) || !(0.0..=1.0).contains(&beta) {
            return false;
        }

        rec.t = t;
        rec.p = p;
        rec.u = alpha;
        rec.v = beta;
        rec.material = &self.material;
        rec.set_face_normal(ray, self.normal);

        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn surface_coords(&self, point: Vec3) -> (f32, f32) {
        self.planar_coords(point)
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        self
    }
}

/// Six quads enclosing the box with opposite corners `a` and `b`.
pub fn cuboid<M: Material + Clone + 'static>(a: Vec3, b: Vec3, material: M) -> HittableList {
    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let mut sides = HittableList::new();
    sides.push(Quad::new(Vec3::new(min.x, min.y, max.z), dx, dy, material.clone())); // front
    sides.push(Quad::new(Vec3::new(max.x, min.y, max.z), -dz, dy, material.clone())); // right
    sides.push(Quad::new(Vec3::new(max.x, min.y, min.z), -dx, dy, material.clone())); // back
    sides.push(Quad::new(Vec3::new(min.x, min.y, min.z), dz, dy, material.clone())); // left
    sides.push(Quad::new(Vec3::new(min.x, max.y, max.z), dx, -dz, material.clone())); // top
    sides.push(Quad::new(Vec3::new(min.x, min.y, min.z), dx, dz, material)); // bottom
    sides
}
