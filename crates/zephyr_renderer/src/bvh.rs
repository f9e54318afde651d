//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree built once from a [`HittableList`] and never modified
//! afterwards, which is what allows render workers to traverse it
//! concurrently without locks.
//!
//! Construction picks a split axis per node by sorting the range along each
//! axis, splitting it at the count midpoint and comparing the summed
//! [`Aabb::effective_size`] of the two halves. The estimate is not weighted
//! by primitive count.

use crate::{BvhError, HitRecord, Hittable, HittableList};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray};

/// One child slot of a [`BvhNode`].
pub enum BvhChild {
    /// Subtree exclusively owned by its parent.
    Node(Box<BvhNode>),
    /// Scene object, as returned by [`Hittable::to_leaf`].
    Leaf(Arc<dyn Hittable>),
}

impl BvhChild {
    fn bounding_box(&self) -> Option<Aabb> {
        match self {
            BvhChild::Node(node) => Some(node.bbox),
            BvhChild::Leaf(object) => object.bounding_box(),
        }
    }

    #[inline]
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        match self {
            BvhChild::Node(node) => node.hit(ray, ray_t, rec),
            BvhChild::Leaf(object) => object.hit(ray, ray_t, rec),
        }
    }

    fn write_tree(&self, depth: usize, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            BvhChild::Node(node) => node.write_tree(depth, out),
            BvhChild::Leaf(object) => object.write_tree(depth, out),
        }
    }

    pub fn as_node(&self) -> Option<&BvhNode> {
        match self {
            BvhChild::Node(node) => Some(node),
            BvhChild::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhChild::Leaf(_))
    }
}

/// BVH node with a mandatory left child and an optional right child.
///
/// A node built from a single object has no right child. The cached box is
/// the union of the children's boxes.
pub struct BvhNode {
    left: BvhChild,
    right: Option<BvhChild>,
    bbox: Aabb,
    axis: usize,
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
}

fn by_axis_min(axis: usize) -> impl Fn(&Arc<dyn Hittable>, &Arc<dyn Hittable>) -> Ordering {
    move |a, b| {
        let a = a.bounding_box().map_or(f32::INFINITY, |bb| bb.axis_min(axis));
        let b = b.bounding_box().map_or(f32::INFINITY, |bb| bb.axis_min(axis));
        a.total_cmp(&b)
    }
}

/// Split cost estimate for `[from, to)` along `axis`. Leaves the range sorted
/// along that axis.
fn axis_estimate(
    objects: &mut HittableList,
    from: usize,
    to: usize,
    axis: usize,
) -> Result<f32, BvhError> {
    let count = to - from;
    if count <= 1 {
        return Ok(0.0);
    }

    objects.sort_range_by(from, to, by_axis_min(axis));
    let mid = from + count / 2;
    let left = objects.aggregate_bounds(from, mid)?;
    let right = objects.aggregate_bounds(mid, to)?;
    Ok(left.effective_size() + right.effective_size())
}

fn leaf(objects: &HittableList, index: usize) -> Result<BvhChild, BvhError> {
    objects
        .get(index)
        .map(|object| BvhChild::Leaf(Arc::clone(object).to_leaf()))
        .ok_or(BvhError::Empty)
}

/// Axis with the smallest estimate; ties go to x, then y, then z.
fn select_axis(estimates: [f32; 3]) -> usize {
    let [x, y, z] = estimates;
    if x <= y && x <= z {
        0
    } else if y <= z {
        1
    } else {
        2
    }
}

impl BvhNode {
    /// Build a BVH over every object in `objects`.
    ///
    /// The list is validated before anything is built: an empty list or an
    /// object without a bounding box is an authoring error and no tree is
    /// returned.
    pub fn new(mut objects: HittableList) -> Result<Self, BvhError> {
        if objects.is_empty() {
            return Err(BvhError::Empty);
        }
        if let Some(index) = objects.first_unbounded() {
            return Err(BvhError::Unbounded { index });
        }

        let len = objects.len();
        Self::build(&mut objects, 0, len)
    }

    /// Recursive construction over `[from, to)`.
    ///
    /// Panics on an empty range; [`BvhNode::new`] never asks for one.
    fn build(objects: &mut HittableList, from: usize, to: usize) -> Result<Self, BvhError> {
        assert!(to > from, "BVH range [{from}, {to}) is empty");
        let count = to - from;

        let estimates = [
            axis_estimate(objects, from, to, 0)?,
            axis_estimate(objects, from, to, 1)?,
            axis_estimate(objects, from, to, 2)?,
        ];
        let axis = select_axis(estimates);
        objects.sort_range_by(from, to, by_axis_min(axis));

        let (left, right) = match count {
            1 => (leaf(objects, from)?, None),
            // The stable sort above already put the lower minimum first.
            2 => (leaf(objects, from)?, Some(leaf(objects, from + 1)?)),
            _ => {
                let mid = from + count / 2;
                let left = Self::build(objects, from, mid)?;
                let right = Self::build(objects, mid, to)?;
                (BvhChild::Node(Box::new(left)), Some(BvhChild::Node(Box::new(right))))
            }
        };

        let left_box = left
            .bounding_box()
            .ok_or(BvhError::Unbounded { index: from })?;
        let bbox = match &right {
            Some(child) => {
                let right_box = child
                    .bounding_box()
                    .ok_or(BvhError::Unbounded { index: to - 1 })?;
                left_box.union(&right_box)
            }
            None => left_box,
        };

        Ok(Self {
            left,
            right,
            bbox,
            axis,
        })
    }

    pub fn left(&self) -> &BvhChild {
        &self.left
    }

    pub fn right(&self) -> Option<&BvhChild> {
        self.right.as_ref()
    }

    /// Axis (0=X, 1=Y, 2=Z) the children were ordered along.
    pub fn split_axis(&self) -> usize {
        self.axis
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    /// Count nodes, leaves and depth of the tree rooted here.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            nodes: 1,
            leaves: 0,
            max_depth: 1,
        };
        for child in std::iter::once(&self.left).chain(self.right.iter()) {
            match child {
                BvhChild::Node(node) => {
                    let sub = node.stats();
                    stats.nodes += sub.nodes;
                    stats.leaves += sub.leaves;
                    stats.max_depth = stats.max_depth.max(sub.max_depth + 1);
                }
                BvhChild::Leaf(_) => stats.leaves += 1,
            }
        }
        stats
    }

    /// Textual dump of the tree: nested `node { ... }` blocks indented by two
    /// spaces per level.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_tree(0, &mut out);
        out
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        if !self.bbox.hit(ray, ray_t) {
            return false;
        }

        let hit_left = self.left.hit(ray, ray_t, rec);

        // The right child is always tested; a left hit only caps the interval.
        let right_t = if hit_left { ray_t.with_max(rec.t) } else { ray_t };
        let hit_right = self
            .right
            .as_ref()
            .is_some_and(|right| right.hit(ray, right_t, rec));

        hit_left || hit_right
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        self
    }

    fn write_tree(&self, depth: usize, out: &mut dyn fmt::Write) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(out, "{indent}node {{")?;
        self.left.write_tree(depth + 1, out)?;
        if let Some(right) = &self.right {
            right.write_tree(depth + 1, out)?;
        }
        writeln!(out, "{indent}}}")
    }
}

impl fmt::Display for BvhNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Quad, Sphere};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use zephyr_math::Vec3;

    fn sphere(center: Vec3, radius: f32) -> Arc<dyn Hittable> {
        Arc::new(Sphere::new(center, radius, Lambertian::new(Vec3::splat(0.5))))
    }

    fn random_spheres(rng: &mut StdRng, count: usize) -> HittableList {
        (0..count)
            .map(|_| {
                let center = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                sphere(center, rng.gen_range(0.1..1.5))
            })
            .collect()
    }

    fn random_ray(rng: &mut StdRng) -> Ray {
        let origin = Vec3::new(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
        );
        let target = Vec3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        );
        Ray::new(origin, target - origin)
    }

    /// Nearest hit distance by testing every object.
    fn brute_force_t(objects: &[Arc<dyn Hittable>], ray: &Ray, ray_t: Interval) -> Option<f32> {
        let mut closest = None;
        for object in objects {
            let mut rec = HitRecord::default();
            if object.hit(ray, ray_t, &mut rec) && closest.map_or(true, |t| rec.t < t) {
                closest = Some(rec.t);
            }
        }
        closest
    }

    fn bvh_t(bvh: &BvhNode, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let mut rec = HitRecord::default();
        bvh.hit(ray, ray_t, &mut rec).then_some(rec.t)
    }

    fn check_containment(node: &BvhNode) {
        let mut expected = node.left.bounding_box().unwrap();
        if let Some(right) = &node.right {
            expected = expected.union(&right.bounding_box().unwrap());
        }
        assert_eq!(node.bbox, expected);

        for child in std::iter::once(&node.left).chain(node.right.iter()) {
            assert!(node.bbox.contains(&child.bounding_box().unwrap()));
            if let Some(sub) = child.as_node() {
                check_containment(sub);
            }
        }
    }

    #[test]
    fn test_bvh_empty_is_an_error() {
        assert!(matches!(BvhNode::new(HittableList::new()), Err(BvhError::Empty)));
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn test_bvh_build_panics_on_empty_range() {
        let mut objects = HittableList::new();
        objects.add(sphere(Vec3::ZERO, 1.0));
        let _ = BvhNode::build(&mut objects, 1, 1);
    }

    #[test]
    fn test_bvh_unbounded_is_an_error() {
        let mut objects = HittableList::new();
        objects.add(sphere(Vec3::ZERO, 1.0));
        objects.add(Arc::new(HittableList::new()));

        assert!(matches!(
            BvhNode::new(objects),
            Err(BvhError::Unbounded { index: 1 })
        ));
    }

    #[test]
    fn test_bvh_single_object() {
        let mut objects = HittableList::new();
        objects.add(sphere(Vec3::new(0.0, 0.0, -1.0), 0.5));
        let bvh = BvhNode::new(objects).unwrap();

        assert!(bvh.left().is_leaf());
        assert!(bvh.right().is_none());

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bvh_t(&bvh, &ray, Interval::new(0.001, f32::INFINITY)), Some(0.5));
    }

    #[test]
    fn test_bvh_two_objects_split_along_x() {
        let mut objects = HittableList::new();
        // Inserted right-to-left so the builder has to reorder them
        objects.add(sphere(Vec3::new(5.0, 0.0, -5.0), 1.0));
        objects.add(sphere(Vec3::new(-5.0, 0.0, -5.0), 1.0));
        let bvh = BvhNode::new(objects).unwrap();

        assert_eq!(bvh.split_axis(), 0);
        assert_eq!(bvh.stats(), BvhStats { nodes: 1, leaves: 2, max_depth: 1 });
        assert!(bvh.left().is_leaf());
        assert!(bvh.right().is_some_and(BvhChild::is_leaf));
        assert_eq!(bvh.left().bounding_box().unwrap().min.x, -6.0);

        // Only the second (right) child is on this ray's path; the left
        // child misses and traversal must still reach the right.
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 4.0).abs() < 1e-4);
        assert!((rec.p - Vec3::new(5.0, 0.0, -4.0)).length() < 1e-4);
    }

    #[test]
    fn test_bvh_closer_hit_in_right_child_wins() {
        let mut objects = HittableList::new();
        // Large far sphere sorts first on every axis, small near one second
        objects.add(sphere(Vec3::new(0.0, 0.0, -20.0), 5.0));
        objects.add(sphere(Vec3::new(0.0, 0.0, -3.0), 0.5));
        let bvh = BvhNode::new(objects).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let t = bvh_t(&bvh, &ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((t - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_containment_invariant() {
        let mut rng = StdRng::seed_from_u64(7);
        let objects = random_spheres(&mut rng, 200);
        let boxes: Vec<Aabb> = objects
            .objects()
            .iter()
            .map(|o| o.bounding_box().unwrap())
            .collect();

        let bvh = BvhNode::new(objects).unwrap();
        check_containment(&bvh);
        for b in &boxes {
            assert!(bvh.bbox().contains(b));
        }
        assert_eq!(bvh.stats().leaves, 200);
    }

    #[test]
    fn test_bvh_matches_brute_force_random() {
        let mut rng = StdRng::seed_from_u64(42);
        let objects = random_spheres(&mut rng, 128);
        let reference = objects.objects().to_vec();
        let bvh = BvhNode::new(objects).unwrap();

        let ray_t = Interval::new(0.001, f32::INFINITY);
        for _ in 0..2000 {
            let ray = random_ray(&mut rng);
            assert_eq!(bvh_t(&bvh, &ray, ray_t), brute_force_t(&reference, &ray, ray_t));
        }
    }

    #[test]
    fn test_bvh_matches_brute_force_collinear() {
        // Every center on the x axis: the y and z estimates tie everywhere
        let objects: HittableList = (0..50)
            .map(|i| sphere(Vec3::new(i as f32 * 0.75, 0.0, 0.0), 0.5))
            .collect();
        let reference = objects.objects().to_vec();
        let bvh = BvhNode::new(objects).unwrap();
        check_containment(&bvh);

        let ray_t = Interval::new(0.001, f32::INFINITY);
        let along = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);
        assert_eq!(bvh_t(&bvh, &along, ray_t), Some(9.5));

        for i in 0..50 {
            let x = i as f32 * 0.75 + 0.1;
            let down = Ray::new(Vec3::new(x, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
            assert_eq!(bvh_t(&bvh, &down, ray_t), brute_force_t(&reference, &down, ray_t));
        }
    }

    #[test]
    fn test_bvh_matches_brute_force_flat_quads() {
        // Zero-thickness boxes on the y axis, stacked at equal heights
        let mut objects = HittableList::new();
        for i in 0..20 {
            for j in 0..3 {
                objects.push(Quad::new(
                    Vec3::new(i as f32, j as f32, 0.0),
                    Vec3::new(0.9, 0.0, 0.0),
                    Vec3::new(0.0, 0.0, 0.9),
                    Lambertian::new(Vec3::ONE),
                ));
            }
        }
        let reference = objects.objects().to_vec();
        let bvh = BvhNode::new(objects).unwrap();
        check_containment(&bvh);

        let mut rng = StdRng::seed_from_u64(3);
        let ray_t = Interval::new(0.001, f32::INFINITY);
        for _ in 0..500 {
            let origin = Vec3::new(rng.gen_range(-1.0..21.0), 5.0, rng.gen_range(-1.0..2.0));
            let direction = Vec3::new(rng.gen_range(-0.2..0.2), -1.0, 0.0);
            let ray = Ray::new(origin, direction);
            assert_eq!(bvh_t(&bvh, &ray, ray_t), brute_force_t(&reference, &ray, ray_t));
        }
    }

    #[test]
    fn test_bvh_is_deterministic() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(11);
            BvhNode::new(random_spheres(&mut rng, 64)).unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a.dump(), b.dump());
        assert_eq!(a.bbox(), b.bbox());
        assert_eq!(a.split_axis(), b.split_axis());
    }

    #[test]
    fn test_bvh_dump_format() {
        let objects: HittableList = (0..3)
            .map(|i| sphere(Vec3::new(i as f32 * 3.0, 0.0, 0.0), 1.0))
            .collect();
        let bvh = BvhNode::new(objects).unwrap();

        let expected = "node {\n  node {\n  }\n  node {\n  }\n}\n";
        assert_eq!(bvh.dump(), expected);
        assert_eq!(bvh.to_string(), expected);
    }

    #[test]
    fn test_bvh_nested_as_leaf() {
        let inner: HittableList = (0..4)
            .map(|i| sphere(Vec3::new(i as f32 * 3.0, 0.0, -10.0), 1.0))
            .collect();
        let mut outer = HittableList::new();
        outer.add(Arc::new(inner));
        outer.add(sphere(Vec3::new(0.0, 20.0, -10.0), 1.0));

        let bvh = BvhNode::new(outer).unwrap();
        assert!(bvh.dump().contains("    node {"));

        let ray = Ray::new(Vec3::new(9.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bvh_t(&bvh, &ray, Interval::new(0.001, f32::INFINITY)), Some(9.0));
    }

    #[test]
    fn test_select_axis_tie_breaking() {
        assert_eq!(select_axis([1.0, 1.0, 1.0]), 0);
        assert_eq!(select_axis([2.0, 1.0, 1.0]), 1);
        assert_eq!(select_axis([2.0, 3.0, 1.0]), 2);
    }

    proptest! {
        #[test]
        fn prop_bvh_matches_brute_force(seed in any::<u64>(), count in 1usize..48) {
            let mut rng = StdRng::seed_from_u64(seed);
            let objects = random_spheres(&mut rng, count);
            let reference = objects.objects().to_vec();
            let bvh = BvhNode::new(objects).unwrap();
            prop_assert_eq!(bvh.stats().leaves, count);

            let ray_t = Interval::new(0.001, f32::INFINITY);
            for _ in 0..64 {
                let ray = random_ray(&mut rng);
                prop_assert_eq!(bvh_t(&bvh, &ray, ray_t), brute_force_t(&reference, &ray, ray_t));
            }
        }
    }
}
