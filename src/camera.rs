/*

    Declare Camera: a look-at pinhole camera with stochastic
    anti-aliasing jitter and an optional thin-lens defocus disk.

    WARNING: setup() must be called after deserialization and before
    get_ray(), it derives the viewport basis from the public fields.

*/

use crate::prelude::*;
use crate::ray::Ray;
use crate::sampler::{random_in_unit_disk, sample_square};

#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Camera {
    /// Ratio of image width over height
    #[default(16.0 / 9.0)]
    pub aspect_ratio: Float,

    /// Rendered image width in pixel count
    #[default = 400]
    pub image_width: usize,

    /// Vertical view angle (field of view), degrees
    #[default = 20.0]
    pub vfov: Float,

    /// Point camera is looking from
    #[default(Vector3::new(13.0, 3.0, 13.0))]
    pub lookfrom: Vector3,

    /// Point camera is looking at
    #[default(Vector3::ZERO)]
    pub lookat: Vector3,

    /// Camera-relative "up" direction
    #[default(Vector3::Y)]
    pub vup: Vector3,

    /// Variation angle of rays through each pixel, degrees. Zero disables
    /// the defocus disk entirely.
    #[default = 0.0]
    pub defocus_angle: Float,

    /// Distance from lookfrom to the plane of perfect focus
    #[default = 10.0]
    pub focus_dist: Float,

    // Derived by setup()
    #[serde(skip)]
    image_height: usize,
    #[serde(skip)]
    center: Vector3,
    #[serde(skip)]
    pixel00_loc: Vector3,
    #[serde(skip)]
    pixel_delta_u: Vector3,
    #[serde(skip)]
    pixel_delta_v: Vector3,
    #[serde(skip)]
    defocus_disk_u: Vector3,
    #[serde(skip)]
    defocus_disk_v: Vector3,
}

impl Camera {

    pub fn setup(&mut self) {
        self.image_height = ((self.image_width as Float / self.aspect_ratio) as usize).max(1);
        self.center = self.lookfrom;

        // Viewport dimensions
        let theta = degrees_to_radians(self.vfov);
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as Float / self.image_height as Float);

        // u,v,w unit basis vectors for the camera coordinate frame
        let w = (self.lookfrom - self.lookat).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u;
        let viewport_v = viewport_height * -v;

        self.pixel_delta_u = viewport_u / self.image_width as Float;
        self.pixel_delta_v = viewport_v / self.image_height as Float;

        let viewport_upper_left =
            self.center - (self.focus_dist * w) - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        let defocus_radius = self.focus_dist * degrees_to_radians(self.defocus_angle / 2.0).tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;

        debug!(
            "camera setup: {}x{} pixels, vfov {} degrees",
            self.image_width, self.image_height, self.vfov
        );
    }

    pub fn image_height(&self) -> usize {
        self.image_height
    }

    pub fn pixel_count(&self) -> usize {
        self.image_width * self.image_height
    }

    /// A camera ray from the defocus disk towards a randomly sampled point
    /// around pixel (i, j). Jitter comes from the thread-local RNG.
    pub fn get_ray(&self, i: usize, j: usize) -> Ray {
        let offset = sample_square();
        let pixel_sample = self.pixel00_loc
            + ((i as Float + offset.x) * self.pixel_delta_u)
            + ((j as Float + offset.y) * self.pixel_delta_v);

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample()
        };
        let ray_direction = (pixel_sample - ray_origin).normalize();

        Ray::new(ray_origin, ray_direction)
    }

    fn defocus_disk_sample(&self) -> Vector3 {
        let p = random_in_unit_disk();
        self.center + (p.x * self.defocus_disk_u) + (p.y * self.defocus_disk_v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_derives_height_from_aspect() {
        let mut cam = Camera::default();
        cam.image_width = 400;
        cam.aspect_ratio = 16.0 / 9.0;
        cam.setup();
        assert_eq!(cam.image_height(), 225);
        assert_eq!(cam.pixel_count(), 400 * 225);
    }

    #[test]
    fn test_center_pixel_ray_points_at_target() {
        let mut cam = Camera::default();
        cam.lookfrom = Vector3::new(0.0, 0.0, 5.0);
        cam.lookat = Vector3::ZERO;
        cam.defocus_angle = 0.0;
        cam.setup();

        let expected = (cam.lookat - cam.lookfrom).normalize();
        let ray = cam.get_ray(cam.image_width / 2, cam.image_height() / 2);
        assert!(ray.direction.is_normalized());
        assert_eq!(ray.origin, cam.lookfrom);
        // Jitter is at most half a pixel, the direction stays very close
        assert!(ray.direction.dot(expected) > 0.999);
    }

    #[test]
    fn test_defocus_moves_ray_origin_onto_disk() {
        let mut cam = Camera::default();
        cam.lookfrom = Vector3::new(0.0, 0.0, 5.0);
        cam.lookat = Vector3::ZERO;
        cam.defocus_angle = 2.0;
        cam.focus_dist = 5.0;
        cam.setup();

        let mut moved = false;
        for _ in 0..50 {
            let ray = cam.get_ray(0, 0);
            if ray.origin != cam.lookfrom {
                moved = true;
            }
            assert!((ray.origin - cam.lookfrom).length() < 0.2);
        }
        assert!(moved);
    }
}
