/*

    Axis Aligned Bounding Box used for fast ray rejection
    and for partitioning primitives while building the BVH.

*/

use crate::interval::Interval;
use crate::prelude::*;
use crate::ray::Ray;

/// Sentinel distance returned by `hit` when the ray misses the box.
pub const MISS: Float = -1.0;

/// Epsilon used to fatten a zero-thickness axis before slab tests,
/// otherwise 0 * inf produces NaN inside the slab arithmetic.
const DEGENERATE_PAD: Float = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BBox {

    /// Corners may be given in any order, they are normalized so min <= max
    /// holds componentwise.
    pub fn new(a: Vector3, b: Vector3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_point(p: Vector3) -> Self {
        Self { min: p, max: p }
    }

    pub fn center(&self) -> Vector3 {
        (self.min + self.max) / 2.0
    }

    /// Closed per-axis intervals, so boundary points count as inside
    pub fn contains(&self, p: Vector3) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }

    pub fn contains_box(&self, other: &BBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn overlaps(&self, other: &BBox) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    pub fn expand_to_contain(&mut self, other: &BBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn expand_to_contain_point(&mut self, p: Vector3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Cheap fallback signal only; the BVH split heuristic is driven by
    /// primitive balance, not by box extent.
    pub fn longest_axis(&self) -> usize {
        let extent = self.max - self.min;
        if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        }
    }

    pub fn midpoint(&self, axis: usize) -> Float {
        (self.min[axis] + self.max[axis]) / 2.0
    }

    /// Rigid translation, extents are unchanged
    pub fn offset(&mut self, v: Vector3) {
        self.min += v;
        self.max += v;
    }

    /// Make sure the box is not a plane (or a line, or a point): any axis of
    /// zero thickness gets padded so slab inverse-direction math stays finite.
    pub fn pad_degenerate(&mut self) {
        if self.min.x == self.max.x { self.max.x += DEGENERATE_PAD; }
        if self.min.y == self.max.y { self.max.y += DEGENERATE_PAD; }
        if self.min.z == self.max.z { self.max.z += DEGENERATE_PAD; }
    }

    /// Slab test. Returns the entry distance along the ray (clamped to zero
    /// when the origin is inside the box), or `MISS` when the ray never
    /// crosses the box in front of its origin.
    ///
    /// Near-zero direction components are deliberately left to divide into
    /// signed infinity; the min/max folding below is order-independent and
    /// relies on IEEE-754 semantics for correctness.
    pub fn hit(&self, ray: &Ray) -> Float {
        let mut tmin = -INFINITY;
        let mut tmax = INFINITY;

        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let t1 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let t2 = (self.max[axis] - ray.origin[axis]) * inv_d;

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        let entry = tmin.max(0.0);
        if tmax > entry { entry } else { MISS }
    }

    pub fn x_interval(&self) -> Interval {
        Interval::new(self.min.x, self.max.x)
    }

    pub fn y_interval(&self) -> Interval {
        Interval::new(self.min.y, self.max.y)
    }

    pub fn z_interval(&self) -> Interval {
        Interval::new(self.min.z, self.max.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BBox {
        BBox::new(Vector3::ZERO, Vector3::ONE)
    }

    #[test]
    fn test_corners_normalized_on_construction() {
        let b = BBox::new(Vector3::new(1.0, -2.0, 3.0), Vector3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.min, Vector3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_union_contains_members() {
        // For any point P inside A, A.union(B).contains(P)
        let a = unit_box();
        let b = BBox::new(Vector3::new(5.0, 5.0, 5.0), Vector3::new(7.0, 9.0, 6.0));
        let mut u = a;
        u.expand_to_contain(&b);
        assert!(u.contains_box(&a));
        assert!(u.contains_box(&b));
        assert!(u.contains(Vector3::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_union_commutative_and_idempotent() {
        let a = unit_box();
        let b = BBox::new(Vector3::new(-3.0, 0.5, 0.0), Vector3::new(0.5, 4.0, 2.0));

        let mut ab = a;
        ab.expand_to_contain(&b);
        let mut ba = b;
        ba.expand_to_contain(&a);
        assert_eq!(ab, ba);

        let mut again = ab;
        again.expand_to_contain(&b);
        assert_eq!(again, ab);
    }

    #[test]
    fn test_overlap_symmetric_and_reflexive() {
        let a = unit_box();
        let b = BBox::new(Vector3::new(0.5, 0.5, 0.5), Vector3::new(2.0, 2.0, 2.0));
        let c = BBox::new(Vector3::new(5.0, 5.0, 5.0), Vector3::new(6.0, 6.0, 6.0));
        assert!(a.overlaps(&a));
        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(!a.overlaps(&c) && !c.overlaps(&a));
    }

    #[test]
    fn test_slab_hit_from_outside() {
        let b = unit_box();
        let ray = Ray::new(Vector3::new(0.5, 0.5, -2.0), Vector3::Z);
        let dist = b.hit(&ray);
        assert!((dist - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_slab_hit_from_inside_is_not_a_miss() {
        let b = unit_box();
        let ray = Ray::new(Vector3::new(0.5, 0.5, 0.5), Vector3::X);
        assert_eq!(b.hit(&ray), 0.0);
    }

    #[test]
    fn test_slab_miss_behind_origin() {
        let b = unit_box();
        let ray = Ray::new(Vector3::new(0.5, 0.5, 2.0), Vector3::Z);
        assert_eq!(b.hit(&ray), MISS);
    }

    #[test]
    fn test_slab_handles_zero_direction_component() {
        // Direction parallel to the x slabs: division yields +-inf, the fold
        // must still accept the ray when it is inside the x interval...
        let b = unit_box();
        let inside = Ray::new(Vector3::new(0.5, 0.5, -1.0), Vector3::Z);
        assert!(b.hit(&inside) >= 0.0);

        // ...and reject it when it is outside
        let outside = Ray::new(Vector3::new(2.0, 0.5, -1.0), Vector3::Z);
        assert_eq!(b.hit(&outside), MISS);
    }

    #[test]
    fn test_degenerate_box_padded_before_slab_use() {
        let mut b = BBox::new(Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(b.min.z, b.max.z);
        b.pad_degenerate();
        assert!(b.max.z > b.min.z);

        let ray = Ray::new(Vector3::new(0.5, 0.5, -1.0), Vector3::Z);
        let dist = b.hit(&ray);
        assert!(dist >= 0.0 && dist.is_finite());
    }

    #[test]
    fn test_longest_axis() {
        let b = BBox::new(Vector3::ZERO, Vector3::new(1.0, 5.0, 2.0));
        assert_eq!(b.longest_axis(), 1);
    }

    #[test]
    fn test_offset_preserves_extent() {
        let mut b = unit_box();
        b.offset(Vector3::new(3.0, -1.0, 0.5));
        assert_eq!(b.max - b.min, Vector3::ONE);
        assert!(b.contains(Vector3::new(3.5, -0.5, 1.0)));
    }
}
