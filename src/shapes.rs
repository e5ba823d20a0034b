/*

    Declare primitives: Triangle, Sphere, and the aggregate
    HittableList. Everything that can be put in the scene (or in
    a BVH leaf) implements the Hittable trait.

*/

use std::fmt::Debug;

use crate::bbox::BBox;
use crate::interval::Interval;
use crate::prelude::*;
use crate::ray::{HitRecord, Ray};

/// Determinant threshold below which a triangle is treated as
/// parallel to (or facing away from) the ray.
const DET_EPSILON: Float = 1e-6;

// =======================================================================================================
// Hittable Trait
// =======================================================================================================
pub trait Hittable: Debug + Send + Sync {
    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord>;

    /// Cached world-space bounds, recomputed after any transform
    fn bounds(&self) -> BBox;

    /// Stable representative point used to decide which side of a BVH
    /// split this primitive belongs to.
    fn origin(&self) -> Vector3;

    fn translate(&mut self, offset: Vector3);
}

pub type HeapAllocatedShape = Box<dyn Hittable>;
pub type ShapeList = Vec<HeapAllocatedShape>;

// =======================================================================================================
// Triangle (impl Hittable)
// =======================================================================================================

#[derive(Debug, Clone)]
pub struct Triangle {
    pub a: Vector3,
    pub b: Vector3,
    pub c: Vector3,
    pub material: usize,

    double_sided: bool,

    // Cache derived from the corners, kept in sync by calc_cache()
    bounds: BBox,
    origin: Vector3,
    edge_ab: Vector3,
    edge_ac: Vector3,
    normal: Vector3, // unnormalized face normal
}

impl Triangle {
    pub fn new(a: Vector3, b: Vector3, c: Vector3, material: usize) -> Self {
        let mut tri = Self {
            a,
            b,
            c,
            material,
            double_sided: false,
            bounds: BBox::from_point(a),
            origin: a,
            edge_ab: Vector3::ZERO,
            edge_ac: Vector3::ZERO,
            normal: Vector3::ZERO,
        };
        tri.calc_cache();
        tri
    }

    /// Disable backface culling for this triangle
    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
    }

    pub fn set_material(&mut self, material: usize) {
        self.material = material;
    }

    fn calc_cache(&mut self) {
        let min = self.a.min(self.b).min(self.c);
        let max = self.a.max(self.b).max(self.c);
        self.bounds = BBox::new(min, max);
        self.origin = (min + max) / 2.0;
        self.edge_ab = self.b - self.a;
        self.edge_ac = self.c - self.a;
        self.normal = self.edge_ab.cross(self.edge_ac);
    }

    pub fn scale(&mut self, origin: Vector3, factors: Vector3) {
        self.a = origin + factors * (self.a - origin);
        self.b = origin + factors * (self.b - origin);
        self.c = origin + factors * (self.c - origin);
        self.calc_cache();
    }

    pub fn rotate(&mut self, angle: Float, origin: Vector3, axis: &Vector3) {
        self.a = rotate_point(self.a, origin, angle, axis);
        self.b = rotate_point(self.b, origin, angle, axis);
        self.c = rotate_point(self.c, origin, angle, axis);
        self.calc_cache();
    }
}

impl Hittable for Triangle {

    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        let ao = ray.origin - self.a;
        let dao = ao.cross(ray.direction);

        // Backface culling unless the triangle is double sided
        let determinant = -ray.direction.dot(self.normal);
        if !self.double_sided && determinant < DET_EPSILON {
            return None;
        }
        if determinant.abs() < DET_EPSILON {
            // Near-parallel, a degenerate triangle also lands here since its
            // face normal is (close to) zero
            return None;
        }

        let inv_det = 1.0 / determinant;

        let dst = ao.dot(self.normal) * inv_det;
        if dst < 0.0 {
            return None;
        }

        let u = self.edge_ac.dot(dao) * inv_det;
        if u < 0.0 {
            return None;
        }

        let v = -self.edge_ab.dot(dao) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        if !t_interval.contains(dst) {
            return None;
        }

        let outward_normal = self.normal.normalize();
        let front_face = ray.is_front_face(outward_normal);
        let normal = if front_face { outward_normal } else { -outward_normal };
        Some(HitRecord::new(ray.at(dst), normal, dst, self.material, front_face).with_uv(u, v))
    }

    fn bounds(&self) -> BBox {
        self.bounds
    }

    fn origin(&self) -> Vector3 {
        self.origin
    }

    fn translate(&mut self, offset: Vector3) {
        self.a += offset;
        self.b += offset;
        self.c += offset;
        self.calc_cache();
    }
}

// =======================================================================================================
// Sphere (impl Hittable)
// =======================================================================================================

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: Float,
    pub material: usize,
}

impl Sphere {
    pub fn new(center: Vector3, radius: Float, material: usize) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }
}

impl Hittable for Sphere {

    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Nearest root within the admissible range
        let mut root = (h - sqrtd) / a;
        if !t_interval.surrounds(root) {
            root = (h + sqrtd) / a;
            if !t_interval.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let outward_normal = (point - self.center) / self.radius;
        let front_face = ray.is_front_face(outward_normal);
        let normal = if front_face { outward_normal } else { -outward_normal };
        Some(HitRecord::new(point, normal, root, self.material, front_face))
    }

    fn bounds(&self) -> BBox {
        let r = Vector3::splat(self.radius);
        BBox::new(self.center - r, self.center + r)
    }

    fn origin(&self) -> Vector3 {
        self.center
    }

    fn translate(&mut self, offset: Vector3) {
        self.center += offset;
    }
}

// =======================================================================================================
// HittableList (aggregate, impl Hittable by delegation)
// =======================================================================================================

#[derive(Debug, Default)]
pub struct HittableList {
    pub objects: ShapeList,
}

impl HittableList {
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    pub fn add(&mut self, object: HeapAllocatedShape) {
        self.objects.push(object);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Hittable for HittableList {

    /// Linear scan keeping the nearest qualifying hit
    fn hit(&self, ray: &Ray, t_interval: &Interval) -> Option<HitRecord> {
        let mut closest_so_far = t_interval.max;
        let mut rec = None;

        for object in &self.objects {
            if let Some(hit) = object.hit(ray, &Interval::new(t_interval.min, closest_so_far)) {
                closest_so_far = hit.ray_t;
                rec = Some(hit);
            }
        }
        rec
    }

    fn bounds(&self) -> BBox {
        let mut objects = self.objects.iter();
        let Some(first) = objects.next() else {
            return BBox::from_point(Vector3::ZERO);
        };
        let mut bounds = first.bounds();
        for object in objects {
            bounds.expand_to_contain(&object.bounds());
        }
        bounds
    }

    fn origin(&self) -> Vector3 {
        self.bounds().center()
    }

    fn translate(&mut self, offset: Vector3) {
        for object in &mut self.objects {
            object.translate(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_triangle() -> Triangle {
        // Lies in the z = -1 plane with its face normal towards +z
        Triangle::new(
            Vector3::new(-1.0, -1.0, -1.0),
            Vector3::new(1.0, -1.0, -1.0),
            Vector3::new(0.0, 1.0, -1.0),
            0,
        )
    }

    #[test]
    fn test_triangle_hit_at_analytic_distance() {
        let tri = facing_triangle();
        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        let rec = tri.hit(&ray, &Interval::positive(1e-3)).expect("should hit");
        assert!((rec.ray_t - 1.0).abs() < 1e-12);
        assert!(rec.is_front_face);
        assert!((rec.normal - Vector3::Z).length() < 1e-12);
        // Hit through the middle: barycentric coords sum below one
        assert!(rec.u >= 0.0 && rec.v >= 0.0 && rec.u + rec.v <= 1.0);
    }

    #[test]
    fn test_triangle_miss_beyond_vertices() {
        let tri = facing_triangle();
        let ray = Ray::new(Vector3::new(5.0, 0.0, 0.0), Vector3::NEG_Z);
        assert!(tri.hit(&ray, &Interval::positive(1e-3)).is_none());
    }

    #[test]
    fn test_triangle_backface_culled_unless_double_sided() {
        let mut tri = facing_triangle();
        // Approach from behind the face
        let ray = Ray::new(Vector3::new(0.0, 0.0, -2.0), Vector3::Z);
        assert!(tri.hit(&ray, &Interval::positive(1e-3)).is_none());

        tri.set_double_sided(true);
        let rec = tri.hit(&ray, &Interval::positive(1e-3)).expect("double sided hit");
        assert!((rec.ray_t - 1.0).abs() < 1e-12);
        // Normal flipped against the ray
        assert!((rec.normal - Vector3::NEG_Z).length() < 1e-12);
    }

    #[test]
    fn test_triangle_degenerate_fails_quietly() {
        let tri = Triangle::new(Vector3::ZERO, Vector3::X, Vector3::new(2.0, 0.0, 0.0), 0);
        let ray = Ray::new(Vector3::new(0.5, 0.0, 1.0), Vector3::NEG_Z);
        assert!(tri.hit(&ray, &Interval::positive(1e-3)).is_none());
    }

    #[test]
    fn test_triangle_transforms_refresh_cache() {
        let mut tri = facing_triangle();
        let before = tri.bounds();

        tri.translate(Vector3::new(0.0, 0.0, -2.0));
        assert!((tri.origin().z - before.center().z + 2.0).abs() < 1e-12);

        tri.scale(tri.origin(), Vector3::splat(2.0));
        let scaled = tri.bounds();
        assert!((scaled.max.x - scaled.min.x - 2.0 * (before.max.x - before.min.x)).abs() < 1e-12);

        tri.rotate(degrees_to_radians(90.0), tri.origin(), &Vector3::Z);
        let rotated = tri.bounds();
        // x and y extents swap under a quarter turn about z
        assert!(((rotated.max.x - rotated.min.x) - (scaled.max.y - scaled.min.y)).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_hit_nearest_root() {
        let sphere = Sphere::new(Vector3::new(0.0, 0.0, -3.0), 1.0, 0);
        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        let rec = sphere.hit(&ray, &Interval::positive(1e-3)).expect("should hit");
        assert!((rec.ray_t - 2.0).abs() < 1e-12);
        assert!((rec.normal - Vector3::Z).length() < 1e-12);
    }

    #[test]
    fn test_list_keeps_closest_hit() {
        let mut list = HittableList::new();
        list.add(Box::new(Sphere::new(Vector3::new(0.0, 0.0, -5.0), 1.0, 0)));
        list.add(Box::new(Sphere::new(Vector3::new(0.0, 0.0, -2.5), 0.5, 1)));

        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        let rec = list.hit(&ray, &Interval::positive(1e-3)).expect("should hit");
        assert_eq!(rec.material, 1);
        assert!((rec.ray_t - 2.0).abs() < 1e-12);
    }
}
