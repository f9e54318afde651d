//! Hittable trait and HitRecord for ray-object intersection.

use crate::{Material, ScatterResult};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray, Vec3};

/// A dummy material used for HitRecord::default().
/// Always absorbs light (returns None from scatter).
struct DummyMaterial;

impl Material for DummyMaterial {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterResult> {
        None
    }
}

static DUMMY_MATERIAL: DummyMaterial = DummyMaterial;

/// Record of a ray-object intersection.
///
/// During traversal this is the closest hit found so far: every primitive
/// that reports a hit overwrites it, and callers shrink the search interval
/// to `rec.t` before testing further primitives.
#[derive(Clone)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Surface coordinates of the hit point
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> Default for HitRecord<'a> {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: &DUMMY_MATERIAL,
            u: 0.0,
            v: 0.0,
            t: f32::INFINITY,
            front_face: false,
        }
    }
}

impl<'a> HitRecord<'a> {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
///
/// Shapes, transform instances, lists and BVH nodes all implement it, so a
/// tree can be nested inside another tree as a leaf.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object within the given interval.
    ///
    /// Returns true if hit, and fills in the hit record. The record is left
    /// untouched on a miss.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool;

    /// Axis-aligned bounds, or `None` for objects without finite extent.
    fn bounding_box(&self) -> Option<Aabb>;

    /// Surface (u, v) coordinates for a point lying on the object.
    fn surface_coords(&self, _point: Vec3) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// The object to store in an acceleration tree leaf in place of `self`.
    ///
    /// Plain shapes return themselves; aggregates return an accelerated
    /// version of their contents.
    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable>;

    /// Write the tree structure below this object, for diagnostics.
    ///
    /// Only acceleration structures produce output.
    fn write_tree(&self, _depth: usize, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }
}
