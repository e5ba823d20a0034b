/*

    Bounding Volume Hierarchy: a recursive binary partition of
    primitives, built once per geometry state and traversed per ray.

    Split axis selection is NOT "longest axis first": every axis is
    tried and the one giving the most balanced primitive counts wins.
    When no axis separates the primitive origins at all, the node
    stays a leaf no matter how many primitives it holds. That is
    intentional, forcing a split there would recurse forever on
    coincident origins.

*/

use crate::bbox::{self, BBox};
use crate::interval::Interval;
use crate::prelude::*;
use crate::ray::{HitRecord, Ray};
use crate::shapes::Hittable;

pub const MAX_SPLIT_DEPTH: usize = 32;

#[derive(Debug)]
pub struct BvhNode<T: Hittable> {
    pub bounds: BBox,
    left: Option<Box<BvhNode<T>>>,
    right: Option<Box<BvhNode<T>>>,
    primitives: Vec<T>, // empty on internal nodes, owned by the two children instead
}

impl<T: Hittable> BvhNode<T> {

    pub fn build(primitives: Vec<T>) -> Self {
        Self::build_at_depth(primitives, 0)
    }

    fn build_at_depth(primitives: Vec<T>, depth: usize) -> Self {
        let mut bounds = match primitives.first() {
            Some(first) => first.bounds(),
            None => BBox::from_point(Vector3::ZERO),
        };
        for primitive in &primitives {
            bounds.expand_to_contain(&primitive.bounds());
        }
        bounds.pad_degenerate();

        let mut node = Self {
            bounds,
            left: None,
            right: None,
            primitives,
        };
        if node.primitives.len() > 1 && depth < MAX_SPLIT_DEPTH {
            node.split(depth);
        }
        node
    }

    /// Try all three axes, keep the one whose box midpoint divides the
    /// primitive origins most evenly. An axis only qualifies if both sides
    /// end up non-empty.
    fn split(&mut self, depth: usize) {
        let mut winner: Option<usize> = None;
        let mut smallest_diff = usize::MAX;

        for axis in 0..3 {
            let split_point = self.bounds.midpoint(axis);
            let left_count = self
                .primitives
                .iter()
                .filter(|p| p.origin()[axis] < split_point)
                .count();
            let right_count = self.primitives.len() - left_count;

            if left_count > 0 && right_count > 0 {
                let diff = left_count.abs_diff(right_count);
                if diff < smallest_diff {
                    smallest_diff = diff;
                    winner = Some(axis);
                }
            }
        }

        let Some(axis) = winner else {
            // All origins collapse onto one side on every axis, keep the
            // oversized leaf instead of recursing into degenerate splits.
            debug!(
                "no separating axis for {} primitives at depth {depth}, keeping oversized leaf",
                self.primitives.len()
            );
            return;
        };

        let split_point = self.bounds.midpoint(axis);
        let total = self.primitives.len();
        let mut left_list = Vec::new();
        let mut right_list = Vec::new();
        for primitive in self.primitives.drain(..) {
            if primitive.origin()[axis] < split_point {
                left_list.push(primitive);
            } else {
                right_list.push(primitive);
            }
        }

        // A lost or duplicated primitive would corrupt renders silently,
        // treat any mismatch as a hard internal error.
        assert!(
            left_list.len() + right_list.len() == total
                && !left_list.is_empty()
                && !right_list.is_empty(),
            "BVH split on axis {axis} broke the partition invariant: {} + {} != {total}",
            left_list.len(),
            right_list.len(),
        );

        self.left = Some(Box::new(Self::build_at_depth(left_list, depth + 1)));
        self.right = Some(Box::new(Self::build_at_depth(right_list, depth + 1)));
    }

    /// Front-to-back pruned traversal. Returns the closest hit in the
    /// reachable subtree, identical to a brute-force scan over the same
    /// primitive set.
    pub fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        let entry = self.bounds.hit(ray);
        if entry < 0.0 || entry > t_interval.max {
            return None; // prune the whole subtree
        }

        if let (Some(left), Some(right)) = (self.left.as_deref(), self.right.as_deref()) {
            let dist_left = left.bounds.hit(ray);
            let dist_right = right.bounds.hit(ray);

            let (near, far, far_entry) = if dist_left <= dist_right {
                (left, right, dist_right)
            } else {
                (right, left, dist_left)
            };

            let near_rec = near.hit(ray, t_interval);
            let closest_so_far = match &near_rec {
                Some(rec) => rec.ray_t,
                None => t_interval.max,
            };

            // Early out: the near hit already beats everything the far
            // child's box could possibly contain.
            if far_entry == bbox::MISS || closest_so_far < far_entry {
                return near_rec;
            }

            let far_rec = far.hit(ray, &Interval::new(t_interval.min, closest_so_far));
            return far_rec.or(near_rec);
        }

        // Leaf: linear scan, closest hit wins
        let mut closest_so_far = t_interval.max;
        let mut rec = None;
        for primitive in &self.primitives {
            if let Some(hit) = primitive.hit(ray, &Interval::new(t_interval.min, closest_so_far)) {
                closest_so_far = hit.ray_t;
                rec = Some(hit);
            }
        }
        rec
    }

    /// Rigid translation through the existing tree, topology is preserved
    pub fn translate(&mut self, offset: Vector3) {
        self.bounds.offset(offset);
        if let Some(left) = self.left.as_deref_mut() {
            left.translate(offset);
        }
        if let Some(right) = self.right.as_deref_mut() {
            right.translate(offset);
        }
        for primitive in &mut self.primitives {
            primitive.translate(offset);
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn primitive_count(&self) -> usize {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => left.primitive_count() + right.primitive_count(),
            _ => self.primitives.len(),
        }
    }

    /// Size of the biggest leaf, a diagnostic for how well splits worked out
    pub fn largest_leaf(&self) -> usize {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => left.largest_leaf().max(right.largest_leaf()),
            _ => self.primitives.len(),
        }
    }

    /// Tear the tree down into its primitives, used before a full rebuild
    /// when a non-rigid transform invalidates the topology.
    pub fn into_primitives(self) -> Vec<T> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => {
                let mut primitives = left.into_primitives();
                primitives.extend(right.into_primitives());
                primitives
            }
            _ => self.primitives,
        }
    }

    /// Visit every leaf primitive mutably. The closure must not change the
    /// geometry (bounds stay untouched), it exists for things like
    /// re-stamping material indices.
    pub fn for_each_primitive_mut<F: FnMut(&mut T)>(&mut self, f: &mut F) {
        if let Some(left) = self.left.as_deref_mut() {
            left.for_each_primitive_mut(f);
        }
        if let Some(right) = self.right.as_deref_mut() {
            right.for_each_primitive_mut(f);
        }
        for primitive in &mut self.primitives {
            f(primitive);
        }
    }

    fn children(&self) -> Option<(&BvhNode<T>, &BvhNode<T>)> {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }
}

impl<T: Hittable> Hittable for BvhNode<T> {
    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        BvhNode::hit(self, ray, t_interval)
    }

    fn bounds(&self) -> BBox {
        self.bounds
    }

    fn origin(&self) -> Vector3 {
        self.bounds.center()
    }

    fn translate(&mut self, offset: Vector3) {
        BvhNode::translate(self, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{random_range, random_unit_vector};
    use crate::shapes::Triangle;

    fn triangle_at(center: Vector3, size: Float) -> Triangle {
        Triangle::new(
            center + Vector3::new(-size, -size, 0.0),
            center + Vector3::new(size, -size, 0.0),
            center + Vector3::new(0.0, size, 0.0),
            0,
        )
    }

    fn random_triangles(count: usize) -> Vec<Triangle> {
        let mut tris = Vec::with_capacity(count);
        for _ in 0..count {
            let center = Vector3::new(
                random_range(-10.0, 10.0),
                random_range(-10.0, 10.0),
                random_range(-10.0, 10.0),
            );
            let mut tri = triangle_at(center, random_range(0.1, 1.5));
            tri.rotate(random_range(0.0, std::f64::consts::TAU), center, &random_unit_vector());
            tri.set_double_sided(true);
            tris.push(tri);
        }
        tris
    }

    fn collect_origins(node: &BvhNode<Triangle>, out: &mut Vec<Vector3>) {
        if let Some((left, right)) = node.children() {
            collect_origins(left, out);
            collect_origins(right, out);
        } else {
            for tri in &node.primitives {
                out.push(tri.origin());
            }
        }
    }

    fn check_containment(node: &BvhNode<Triangle>) {
        if let Some((left, right)) = node.children() {
            assert!(node.bounds.contains_box(&left.bounds));
            assert!(node.bounds.contains_box(&right.bounds));
            check_containment(left);
            check_containment(right);
        } else {
            for tri in &node.primitives {
                assert!(node.bounds.contains_box(&tri.bounds()));
            }
        }
    }

    #[test]
    fn test_single_triangle_is_a_leaf() {
        let tree = BvhNode::build(vec![triangle_at(Vector3::new(0.0, 0.0, -2.0), 1.0)]);
        assert!(tree.is_leaf());
        assert_eq!(tree.primitive_count(), 1);

        // Ray through the centroid hits at the known parametric distance
        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        let rec = tree.hit(&ray, &Interval::positive(1e-3)).expect("should hit");
        assert!((rec.ray_t - 2.0).abs() < 1e-12);

        // Offset beyond any vertex misses
        let miss = Ray::new(Vector3::new(10.0, 0.0, 0.0), Vector3::NEG_Z);
        assert!(tree.hit(&miss, &Interval::positive(1e-3)).is_none());
    }

    #[test]
    fn test_two_triangles_split_into_singleton_leaves() {
        let tree = BvhNode::build(vec![
            triangle_at(Vector3::new(-5.0, 0.0, 0.0), 1.0),
            triangle_at(Vector3::new(5.0, 0.0, 0.0), 1.0),
        ]);
        assert!(!tree.is_leaf());
        let (left, right) = tree.children().expect("two children");
        assert!(left.is_leaf() && right.is_leaf());
        assert_eq!(left.primitive_count(), 1);
        assert_eq!(right.primitive_count(), 1);
    }

    #[test]
    fn test_coincident_origins_stay_an_oversized_leaf() {
        let tri = triangle_at(Vector3::ZERO, 1.0);
        let tree = BvhNode::build(vec![tri.clone(), tri.clone(), tri]);
        assert!(tree.is_leaf());
        assert_eq!(tree.largest_leaf(), 3);
    }

    #[test]
    fn test_no_primitive_lost_or_duplicated() {
        let tris = random_triangles(128);
        let mut expected: Vec<Vector3> = tris.iter().map(|t| t.origin()).collect();

        let tree = BvhNode::build(tris);
        assert_eq!(tree.primitive_count(), 128);

        let mut found = Vec::new();
        collect_origins(&tree, &mut found);
        assert_eq!(found.len(), 128);

        let key = |v: &Vector3| (v.x.to_bits(), v.y.to_bits(), v.z.to_bits());
        expected.sort_by_key(key);
        found.sort_by_key(key);
        for (a, b) in expected.iter().zip(found.iter()) {
            assert_eq!(key(a), key(b));
        }

        // Draining the tree gives the same multiset back
        assert_eq!(tree.into_primitives().len(), 128);
    }

    #[test]
    fn test_every_node_contains_its_descendants() {
        let tree = BvhNode::build(random_triangles(200));
        check_containment(&tree);
    }

    #[test]
    fn test_traversal_matches_brute_force() {
        let tris = random_triangles(64);
        let tree = BvhNode::build(tris.clone());
        let t_interval = Interval::positive(1e-3);

        for _ in 0..500 {
            let origin = Vector3::new(
                random_range(-15.0, 15.0),
                random_range(-15.0, 15.0),
                random_range(-15.0, 15.0),
            );
            let ray = Ray::new(origin, random_unit_vector());

            let naive = tris
                .iter()
                .filter_map(|t| t.hit(&ray, &t_interval))
                .min_by(|a, b| a.ray_t.total_cmp(&b.ray_t));
            let accelerated = tree.hit(&ray, &t_interval);

            match (naive, accelerated) {
                (Some(a), Some(b)) => assert!((a.ray_t - b.ray_t).abs() < 1e-9),
                (None, None) => {}
                (a, b) => panic!("naive = {:?}, bvh = {:?}", a.map(|r| r.ray_t), b.map(|r| r.ray_t)),
            }
        }
    }

    #[test]
    fn test_translate_preserves_topology_and_hits() {
        let mut tree = BvhNode::build(vec![
            triangle_at(Vector3::new(-5.0, 0.0, -2.0), 1.0),
            triangle_at(Vector3::new(5.0, 0.0, -2.0), 1.0),
        ]);
        assert!(!tree.is_leaf());

        let offset = Vector3::new(1.0, 2.0, -3.0);
        tree.translate(offset);
        assert!(!tree.is_leaf()); // no re-split happened

        let ray = Ray::new(Vector3::new(-4.0, 2.0, 0.0), Vector3::NEG_Z);
        let rec = tree.hit(&ray, &Interval::positive(1e-3)).expect("hit after move");
        assert!((rec.ray_t - 5.0).abs() < 1e-12);
        check_containment(&tree);
    }

    #[test]
    fn test_interval_upper_bound_prunes() {
        let tree = BvhNode::build(vec![triangle_at(Vector3::new(0.0, 0.0, -10.0), 1.0)]);
        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        // The box entry distance exceeds the search interval, so no hit
        assert!(tree.hit(&ray, &Interval::new(1e-3, 5.0)).is_none());
        assert!(tree.hit(&ray, &Interval::new(1e-3, 15.0)).is_some());
    }
}
