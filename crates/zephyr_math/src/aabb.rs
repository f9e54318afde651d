use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Stored as two corners with `min <= max` on every axis. Flat boxes
/// (`min == max` on an axis, e.g. around a quad) are valid and intersect
/// normally.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from its corners. The corners must already be ordered.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary opposite corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Component-wise union, same as [`Aabb::surrounding`].
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::surrounding(self, other)
    }

    /// Minimum corner coordinate on `axis` (0=X, 1=Y, 2=Z).
    #[inline]
    pub fn axis_min(&self, axis: usize) -> f32 {
        self.min[axis]
    }

    /// Extent of the box along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Split-cost proxy used by BVH axis selection: half of the surface area.
    ///
    /// Only compared against other estimates, never used for correctness.
    pub fn effective_size(&self) -> f32 {
        let d = self.extent();
        d.x * d.y + d.y * d.z + d.z * d.x
    }

    /// True if `other` lies entirely inside this box (boundaries included).
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. A direction component of exactly zero means the ray runs
    /// parallel to that slab: it is unbounded inside the slab and misses
    /// outside it, which keeps `0 * inf` NaNs out of the interval.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for axis in 0..3 {
            let origin = r.origin[axis];
            let dir = r.direction[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];

            if dir == 0.0 {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }

            let adinv = 1.0 / dir;
            let mut t0 = (lo - origin) * adinv;
            let mut t1 = (hi - origin) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return false;
            }
        }

        true
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Identity for [`Aabb::union`]; contains nothing.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points_orders_corners() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));
        assert_eq!(aabb.min, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(aabb.max, Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_aabb_union() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let box2 = Aabb::from_points(Vec3::splat(3.0), Vec3::new(10.0, 4.0, 10.0));
        let union = box1.union(&box2);

        assert_eq!(union.min, Vec3::ZERO);
        assert_eq!(union.max, Vec3::new(10.0, 5.0, 10.0));
        assert!(union.contains(&box1));
        assert!(union.contains(&box2));
        assert_eq!(Aabb::EMPTY.union(&box1), box1);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();
        let everything = Interval::new(0.0, 100.0);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&ray, everything));

        let away = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&away, everything));

        let beside = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&beside, everything));

        // Box lies beyond the allowed interval
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_aabb_hit_negative_direction() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(-1.0, -1.0, -1.0));
        assert!(aabb.hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_aabb_hit_zero_direction_on_slab_boundary() {
        // Origin exactly on the slab plane with a zero component would give
        // 0 * inf = NaN in a naive implementation.
        let aabb = unit_box();
        let grazing = Ray::new(Vec3::new(1.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&grazing, Interval::new(0.0, f32::INFINITY)));

        let outside = Ray::new(Vec3::new(1.5, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&outside, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_aabb_hit_flat_box() {
        // Zero thickness along Y, like the bounds of a floor quad
        let flat = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        let down = Ray::new(Vec3::new(0.25, 3.0, 0.25), Vec3::new(0.0, -1.0, 0.0));
        assert!(flat.hit(&down, Interval::new(0.0, f32::INFINITY)));

        let parallel = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(flat.hit(&parallel, Interval::new(0.0, f32::INFINITY)));

        let parallel_above = Ray::new(Vec3::new(-5.0, 0.1, 0.0), Vec3::X);
        assert!(!flat.hit(&parallel_above, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_aabb_effective_size() {
        let cube = Aabb::from_points(Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(cube.effective_size(), 12.0);

        let flat = Aabb::from_points(Vec3::ZERO, Vec3::new(2.0, 0.0, 3.0));
        assert_eq!(flat.effective_size(), 6.0);

        let point = Aabb::from_points(Vec3::ONE, Vec3::ONE);
        assert_eq!(point.effective_size(), 0.0);
    }

    #[test]
    fn test_aabb_centroid_and_axis_min() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 2.0));
        assert_eq!(aabb.centroid(), Vec3::new(0.5, 5.0, 1.0));
        assert_eq!(aabb.axis_min(2), 0.0);
    }
}
