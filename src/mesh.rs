/*

    Triangle mesh owning its geometry inside a BVH.

    Rigid motion (translate / set_origin) walks the existing tree and
    offsets bounds in place. Anything that changes shape (scale,
    rotation) drains the tree, transforms the triangles and rebuilds
    from scratch, a stale topology would break the pruning guarantees.

*/

use crate::bbox::BBox;
use crate::bvh::BvhNode;
use crate::interval::Interval;
use crate::prelude::*;
use crate::ray::{HitRecord, Ray};
use crate::shapes::{Hittable, Triangle};

#[derive(Debug)]
pub struct Mesh {
    bvh: BvhNode<Triangle>,
    origin: Vector3,
}

impl Mesh {

    pub fn new(triangles: Vec<Triangle>) -> Self {
        let count = triangles.len();
        let bvh = BvhNode::build(triangles);
        debug!(
            "built mesh BVH over {count} triangles, largest leaf holds {}",
            bvh.largest_leaf()
        );
        Self {
            bvh,
            origin: Vector3::ZERO,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.primitive_count()
    }

    /// Diagnostic: size of the biggest BVH leaf
    pub fn largest_leaf(&self) -> usize {
        self.bvh.largest_leaf()
    }

    /// Move the mesh so its origin lands on p, reusing the tree topology
    pub fn set_origin(&mut self, p: Vector3) {
        let offset = p - self.origin;
        self.translate(offset);
    }

    pub fn set_material(&mut self, material: usize) {
        self.bvh
            .for_each_primitive_mut(&mut |tri| tri.set_material(material));
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.bvh
            .for_each_primitive_mut(&mut |tri| tri.set_double_sided(double_sided));
    }

    pub fn scale_uniform(&mut self, factor: Float) {
        self.scale(Vector3::splat(factor));
    }

    pub fn scale(&mut self, factors: Vector3) {
        let origin = self.origin;
        self.rebuild_with(|tri| tri.scale(origin, factors));
    }

    pub fn rotate(&mut self, angle: Float, axis: &Vector3) {
        if approx_zero(angle) {
            return;
        }
        let origin = self.origin;
        let axis = *axis;
        self.rebuild_with(|tri| tri.rotate(angle, origin, &axis));
    }

    /// Non-rigid transforms invalidate the tree: drain, mutate, rebuild
    fn rebuild_with<F: FnMut(&mut Triangle)>(&mut self, mut f: F) {
        let placeholder = BvhNode::build(Vec::new());
        let mut triangles = std::mem::replace(&mut self.bvh, placeholder).into_primitives();
        for tri in &mut triangles {
            f(tri);
        }
        self.bvh = BvhNode::build(triangles);
    }
}

impl Hittable for Mesh {

    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        self.bvh.hit(ray, t_interval)
    }

    fn bounds(&self) -> BBox {
        self.bvh.bounds
    }

    fn origin(&self) -> Vector3 {
        self.origin
    }

    fn translate(&mut self, offset: Vector3) {
        self.bvh.translate(offset);
        self.origin += offset;
    }
}
