/*

    Declare Material trait and its implementations:
        - Lambertian (flat albedo)
        - TexturedLambertian (albedo sampled from a texture map)
        - Metal
        - Dielectric

    Materials answer one question: given an incoming ray and a hit,
    is there a scattered ray, and what attenuation does it carry?
    None means the ray was absorbed.

    The registry replaces the old idea of a global name->material
    map: it is owned by the Scene, filled while loading, and only
    read during rendering. Primitives refer to materials by index.

*/

use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;
use crate::ray::{HitRecord, Ray};
use crate::sampler::random_unit_vector;
use crate::texture::Texture;

pub trait Material: Debug + Send + Sync {
    /// Returns the scattered ray and its attenuation color, or None when
    /// the incoming ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Ray, Vector3)>;
}

pub type HeapAllocMaterial = Box<dyn Material>;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////
///
/// LAMBERTIAN
///
////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct Lambertian {
    pub albedo: Vector3,
}

impl Lambertian {
    pub fn new(albedo: Vector3) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord) -> Option<(Ray, Vector3)> {
        let mut scatter_direction = rec.normal + random_unit_vector();

        // Catch degenerate scatter direction
        if near_zero(&scatter_direction) {
            scatter_direction = rec.normal;
        }

        let scattered = Ray::new(rec.hit_point, scatter_direction.normalize());
        Some((scattered, self.albedo))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////
///
/// TEXTURED LAMBERTIAN
///
////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct TexturedLambertian {
    texture: Texture,
}

impl TexturedLambertian {
    pub fn new(texture: Texture) -> Self {
        Self { texture }
    }
}

impl Material for TexturedLambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord) -> Option<(Ray, Vector3)> {
        let mut scatter_direction = rec.normal + random_unit_vector();
        if near_zero(&scatter_direction) {
            scatter_direction = rec.normal;
        }

        let scattered = Ray::new(rec.hit_point, scatter_direction.normalize());
        let attenuation = self.texture.sample(rec.u, rec.v);
        Some((scattered, attenuation))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////
///
/// METAL
///
////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct Metal {
    pub albedo: Vector3,
    pub fuzz: Float,
}

impl Metal {
    pub fn new(albedo: Vector3, fuzz: Float) -> Self {
        Self {
            albedo,
            fuzz: fuzz.min(1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Ray, Vector3)> {
        let reflected = reflect(ray_in.direction, rec.normal);
        let direction = reflected.normalize() + self.fuzz * random_unit_vector();

        // Fuzz can push the ray below the surface, absorb it there
        if near_zero(&direction) || direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        let scattered = Ray::new(rec.hit_point, direction.normalize());
        Some((scattered, self.albedo))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////
///
/// DIELECTRIC
///
////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Refractive index in vacuum or air, or the ratio of the material's
    /// index over the index of the enclosing media
    pub refraction_index: Float,
}

impl Dielectric {
    pub fn new(refraction_index: Float) -> Self {
        Self { refraction_index }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: Float, refraction_index: Float) -> Float {
        let r0 = (1.0 - refraction_index) / (1.0 + refraction_index);
        let r0 = r0 * r0;
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Ray, Vector3)> {
        let attenuation = Vector3::ONE;
        let ri = if rec.is_front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };

        let unit_direction = ray_in.direction;
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let cannot_refract = ri * sin_theta > 1.0;
        let direction = if cannot_refract || Self::reflectance(cos_theta, ri) > random_float() {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ri)
        };

        let scattered = Ray::new(rec.hit_point, direction.normalize());
        Some((scattered, attenuation))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////
///
/// MATERIAL REGISTRY
///
////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct MaterialRegistry {
    materials: Vec<HeapAllocMaterial>,
    by_name: HashMap<String, usize>,
}

impl MaterialRegistry {

    /// Slot reserved for the magenta fallback material
    pub const MISSING_TEXTURE: usize = 0;

    pub fn new() -> Self {
        let mut registry = Self {
            materials: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.add(
            "missing_texture",
            Box::new(Lambertian::new(Vector3::new(1.0, 0.0, 1.0))),
        );
        registry
    }

    /// Register a material under a name and return its index. A duplicate
    /// name keeps the existing entry.
    pub fn add(&mut self, name: &str, material: HeapAllocMaterial) -> usize {
        if let Some(&index) = self.by_name.get(name) {
            warn!("Material with name '{name}' already exists. Skipping addition.");
            return index;
        }
        let index = self.materials.len();
        self.materials.push(material);
        self.by_name.insert(name.to_string(), index);
        index
    }

    /// Index of the named material, or the missing-texture fallback
    pub fn index_of(&self, name: &str) -> usize {
        match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                warn!("Unknown material '{name}', falling back to missing_texture");
                Self::MISSING_TEXTURE
            }
        }
    }

    pub fn get(&self, index: usize) -> &dyn Material {
        self.materials
            .get(index)
            .unwrap_or(&self.materials[Self::MISSING_TEXTURE])
            .as_ref()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upward_hit() -> HitRecord {
        HitRecord::new(Vector3::ZERO, Vector3::Y, 1.0, 0, true)
    }

    #[test]
    fn test_lambertian_scatters_around_normal() {
        let mat = Lambertian::new(Vector3::new(0.8, 0.2, 0.2));
        let ray_in = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::NEG_Y);
        for _ in 0..100 {
            let (scattered, attenuation) = mat.scatter(&ray_in, &upward_hit()).expect("always scatters");
            assert!(scattered.direction.is_normalized());
            assert_eq!(attenuation, Vector3::new(0.8, 0.2, 0.2));
        }
    }

    #[test]
    fn test_metal_absorbs_below_surface() {
        // Full fuzz sometimes produces directions under the surface, which
        // must come back as None rather than a bogus ray
        let mat = Metal::new(Vector3::ONE, 1.0);
        let ray_in = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, -1.0, 0.0).normalize());
        let mut scattered_count = 0;
        for _ in 0..200 {
            if let Some((scattered, _)) = mat.scatter(&ray_in, &upward_hit()) {
                assert!(scattered.direction.dot(Vector3::Y) > 0.0);
                scattered_count += 1;
            }
        }
        assert!(scattered_count > 0);
    }

    #[test]
    fn test_dielectric_always_scatters() {
        let mat = Dielectric::new(1.5);
        let ray_in = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.3, -1.0, 0.0).normalize());
        let (_, attenuation) = mat.scatter(&ray_in, &upward_hit()).expect("glass never absorbs");
        assert_eq!(attenuation, Vector3::ONE);
    }

    #[test]
    fn test_registry_fallback_and_duplicates() {
        let mut registry = MaterialRegistry::new();
        assert_eq!(registry.len(), 1); // missing_texture is preinstalled

        let red = registry.add("red", Box::new(Lambertian::new(Vector3::X)));
        assert_eq!(registry.index_of("red"), red);

        // Duplicate registration keeps the first entry
        let again = registry.add("red", Box::new(Lambertian::new(Vector3::Z)));
        assert_eq!(again, red);
        assert_eq!(registry.len(), 2);

        // Unknown names resolve to the fallback slot
        assert_eq!(registry.index_of("nope"), MaterialRegistry::MISSING_TEXTURE);
    }
}
