/*

    Tile scheduler and the recursive ray coloring loop.

    The image is chopped into contiguous row-major index ranges, one
    render job per range. Jobs share the Scene read-only and each
    write into their own exclusive slice of the framebuffer, so the
    buffer itself needs no lock. Execution order between jobs is
    unspecified and must not matter.

*/

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::image::{FrameBuffer, ImageData};
use crate::interval::Interval;
use crate::prelude::*;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::shapes::Hittable;
use crate::threadpool::{self, ThreadPool};

/// Rays are offset a little from surfaces to dodge shadow acne
const RAY_EPSILON: Float = 1e-3;

/// Partition `pixel_count` row-major indices into contiguous chunks of at
/// most `tile_pixels` each. The chunks are disjoint and cover every index
/// exactly once; the last one is truncated when the division is not even.
pub fn tile_ranges(pixel_count: usize, tile_pixels: usize) -> Vec<Range<usize>> {
    assert!(tile_pixels > 0, "tile size must be positive");

    let mut ranges = Vec::with_capacity(pixel_count.div_ceil(tile_pixels));
    let mut start = 0;
    while start < pixel_count {
        let end = (start + tile_pixels).min(pixel_count);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Recursive ray coloring: scatter until the material absorbs the ray,
/// the bounce budget runs out, or the ray escapes into the background.
pub fn ray_color(ray: &Ray, scene: &Scene, depth: usize) -> Vector3 {
    if depth == 0 {
        // Bounce limit exhausted, no more light is gathered
        return Vector3::ZERO;
    }

    let t_interval = Interval::positive(RAY_EPSILON);
    if let Some(rec) = scene.world.hit(ray, &t_interval) {
        let material = scene.registry.get(rec.material);
        return match material.scatter(ray, &rec) {
            Some((scattered, attenuation)) => attenuation * ray_color(&scattered, scene, depth - 1),
            None => Vector3::ZERO, // absorbed
        };
    }

    // Miss: vertical background gradient
    let a = 0.5 * (ray.direction.y + 1.0);
    (1.0 - a) * scene.settings.background_horizon + a * scene.settings.background_zenith
}

/// Render the scene into an image. Blocks until every tile is done and
/// the worker pool has shut down.
pub fn render(scene: &Arc<Scene>, image_name: String) -> ImageData {
    let width = scene.camera.image_width;
    let height = scene.camera.image_height();
    assert!(height > 0, "camera.setup() must run before rendering");

    let samples = scene.settings.samples_per_pixel.max(1);
    let samples_scale = 1.0 / samples as Float;
    let max_depth = scene.settings.max_depth;

    let framebuffer = Arc::new(FrameBuffer::new(width * height));
    let pool = ThreadPool::start(
        scene
            .settings
            .threads
            .unwrap_or_else(threadpool::hardware_parallelism),
    );

    let render_start = Instant::now();
    let ranges = tile_ranges(width * height, scene.settings.tile_size * scene.settings.tile_size);
    let total_tiles = ranges.len();
    info!(
        "Rendering {width}x{height} pixels in {total_tiles} tiles on {} threads",
        pool.thread_count()
    );

    for range in ranges {
        let scene = Arc::clone(scene);
        let framebuffer = Arc::clone(&framebuffer);
        pool.submit(move || {
            // SAFETY: tile_ranges produced this range, ranges are pairwise
            // disjoint and each is handed to exactly one job.
            let tile = unsafe { framebuffer.tile_mut(range.clone()) };

            for (pixel, pixel_index) in tile.iter_mut().zip(range) {
                let i = pixel_index % width;
                let j = pixel_index / width;

                let mut color = Vector3::ZERO;
                for _ in 0..samples {
                    let ray = scene.camera.get_ray(i, j);
                    color += ray_color(&ray, &scene, max_depth);
                }
                *pixel = color * samples_scale;
            }
        });
    }

    // Poll only for progress reporting, the real completion barrier is the
    // drain-then-join inside shutdown()
    let mut pool = pool;
    let mut last_reported = usize::MAX;
    loop {
        let pending = pool.pending_count();
        if pending == 0 {
            break;
        }
        if pending != last_reported {
            info!("Rendering... {pending} of {total_tiles} tiles queued");
            last_reported = pending;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    pool.shutdown();
    info!("Render took {:?}", render_start.elapsed());

    let framebuffer = Arc::try_unwrap(framebuffer)
        .unwrap_or_else(|_| panic!("framebuffer still shared after pool shutdown"));
    ImageData::new(width, height, image_name, framebuffer.into_pixels())
}
