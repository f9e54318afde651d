//! Scene: a camera and the accelerated world it looks at.

use crate::{BvhError, BvhNode, Camera, Hittable, HittableList};
use std::fmt::Write;
use std::sync::Arc;

/// Everything a render pass reads. Shared read-only by all render tasks.
#[derive(Clone)]
pub struct Scene {
    pub camera: Camera,
    world: Arc<dyn Hittable>,
}

impl Scene {
    pub fn new(camera: Camera, world: Arc<dyn Hittable>) -> Self {
        Self { camera, world }
    }

    /// Build a BVH over `objects` and use it as the world.
    pub fn from_objects(camera: Camera, objects: HittableList) -> Result<Self, BvhError> {
        let count = objects.len();
        let bvh = BvhNode::new(objects)?;
        let stats = bvh.stats();
        log::info!(
            "Built BVH over {} objects: {} nodes, {} leaves, depth {}",
            count,
            stats.nodes,
            stats.leaves,
            stats.max_depth
        );
        Ok(Self::new(camera, Arc::new(bvh)))
    }

    pub fn world(&self) -> &dyn Hittable {
        self.world.as_ref()
    }

    /// Textual dump of the world's acceleration structure.
    pub fn dump_world(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.world.write_tree(0, &mut out);
        if out.is_empty() {
            let _ = writeln!(out, "(no acceleration structure)");
        }
        out
    }
}
