use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

impl Ray {

    pub fn new(origin: Vector3, direction: Vector3) -> Self {
        debug_assert!(direction.is_normalized());
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: Float) -> Vector3 {
        self.origin + self.direction * t // r(t) = o + dt
    }

    #[inline]
    pub fn is_front_face(&self, normal: Vector3) -> bool {
        self.direction.dot(normal) <= 0.0
    }
}

/// Closest intersection found along a ray. `ray_t` orders hits since t=0 is
/// the ray origin, so the smaller t is, the closer the surface is.
#[derive(Debug, Default, Clone)]
pub struct HitRecord {
    pub hit_point: Vector3,
    pub normal: Vector3,
    pub ray_t: Float,
    pub material: usize, // index into the MaterialRegistry
    pub is_front_face: bool,
    pub u: Float, // barycentric / texture coordinates
    pub v: Float,
}

impl HitRecord {
    pub fn new(hit_point: Vector3, normal: Vector3, ray_t: Float, material: usize, is_front_face: bool) -> Self {
        Self {
            hit_point,
            normal,
            ray_t,
            material,
            is_front_face,
            u: 0.0,
            v: 0.0,
        }
    }

    pub fn with_uv(mut self, u: Float, v: Float) -> Self {
        self.u = u;
        self.v = v;
        self
    }
}
