//! Ordered collection of hittable objects.

use crate::{BvhError, BvhNode, HitRecord, Hittable};
use std::cmp::Ordering;
use std::sync::Arc;
use zephyr_math::{Aabb, Interval, Ray};

/// A list of shared hittable objects.
///
/// This is the input to BVH construction, which reorders ranges of it in
/// place. It is also a hittable itself, tested by a linear scan.
#[derive(Clone)]
pub struct HittableList {
    objects: Vec<Arc<dyn Hittable>>,
    bbox: Aabb,
    first_unbounded: Option<usize>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
            first_unbounded: None,
        }
    }

    /// Add a shared object to the list.
    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        match object.bounding_box() {
            Some(b) => self.bbox = self.bbox.union(&b),
            None => {
                self.first_unbounded.get_or_insert(self.objects.len());
            }
        }
        self.objects.push(object);
    }

    /// Add an owned object to the list.
    pub fn push<H: Hittable + 'static>(&mut self, object: H) {
        self.add(Arc::new(object));
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
        self.first_unbounded = None;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Arc<dyn Hittable>] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn Hittable>> {
        self.objects.get(index)
    }

    /// Index of the first object that reports no bounding box.
    ///
    /// Recomputed on demand because range sorting moves objects around.
    pub fn first_unbounded(&self) -> Option<usize> {
        self.first_unbounded?;
        self.objects.iter().position(|o| o.bounding_box().is_none())
    }

    /// Union of the bounding boxes of objects in `[from, to)`.
    pub fn aggregate_bounds(&self, from: usize, to: usize) -> Result<Aabb, BvhError> {
        if from >= to || to > self.objects.len() {
            return Err(BvhError::Empty);
        }

        self.objects[from..to]
            .iter()
            .enumerate()
            .try_fold(Aabb::EMPTY, |acc, (i, object)| {
                object
                    .bounding_box()
                    .map(|b| acc.union(&b))
                    .ok_or(BvhError::Unbounded { index: from + i })
            })
    }

    /// Stable sort of `[from, to)` only; elements outside the range keep
    /// their positions.
    pub fn sort_range_by<F>(&mut self, from: usize, to: usize, compare: F)
    where
        F: FnMut(&Arc<dyn Hittable>, &Arc<dyn Hittable>) -> Ordering,
    {
        self.objects[from..to].sort_by(compare);
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Arc<dyn Hittable>> for HittableList {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Hittable>>>(iter: I) -> Self {
        let mut list = HittableList::new();
        for object in iter {
            list.add(object);
        }
        list
    }
}

impl Hittable for HittableList {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if object.hit(ray, ray_t.with_max(closest_so_far), rec) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    fn bounding_box(&self) -> Option<Aabb> {
        if self.objects.is_empty() || self.first_unbounded.is_some() {
            None
        } else {
            Some(self.bbox)
        }
    }

    fn to_leaf(self: Arc<Self>) -> Arc<dyn Hittable> {
        // A list that cannot be bounded stays a linear scan.
        match BvhNode::new((*self).clone()) {
            Ok(bvh) => Arc::new(bvh),
            Err(_) => self,
        }
    }
}
