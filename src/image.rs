/*

    Framebuffer shared by the render workers, plus the finished
    image container and its PNG writer.

*/

use std::cell::UnsafeCell;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::interval::Interval;
use crate::prelude::*;

/// Flat row-major pixel store written concurrently by render jobs.
///
/// There is deliberately no lock around the pixels: every job owns a
/// contiguous, non-overlapping index range (see `renderer::tile_ranges`),
/// so writes never alias. That disjoint-write invariant is the whole
/// synchronization story.
pub struct FrameBuffer {
    pixels: UnsafeCell<Vec<Vector3>>,
    pixel_count: usize,
}

// SAFETY: shared access is sound because mutation only happens through
// `tile_mut`, whose contract forbids overlapping ranges across threads.
unsafe impl Sync for FrameBuffer {}

impl FrameBuffer {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixels: UnsafeCell::new(vec![Vector3::ZERO; pixel_count]),
            pixel_count,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Mutable view of one tile.
    ///
    /// # Safety
    /// Callers must guarantee that no two live slices returned by this
    /// method overlap. The tile scheduler upholds this by handing every
    /// job exactly one range produced by `renderer::tile_ranges`.
    pub unsafe fn tile_mut(&self, range: Range<usize>) -> &mut [Vector3] {
        debug_assert!(range.end <= self.pixel_count);
        let pixels = unsafe { &mut *self.pixels.get() };
        &mut pixels[range]
    }

    pub fn into_pixels(self) -> Vec<Vector3> {
        self.pixels.into_inner()
    }
}

#[derive(Clone)]
pub struct ImageData {
    pixel_colors: Vec<Vector3>, // linear-space RGB per pixel, row-major
    width: usize,
    height: usize,
    name: String,
}

impl ImageData {

    pub fn new(width: usize, height: usize, name: String, pixel_colors: Vec<Vector3>) -> Self {
        debug_assert_eq!(pixel_colors.len(), width * height);
        ImageData {
            pixel_colors,
            width,
            height,
            name,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Gamma correct, clamp and return a flattened R G B byte array
    pub fn to_rgb(self) -> Vec<u8> {
        let intensity = Interval::new(0.0, 0.999);
        self.pixel_colors
            .into_iter()
            .flat_map(|color| [color.x, color.y, color.z])
            .map(|x| {
                let gamma = if x > 0.0 { x.sqrt() } else { 0.0 };
                (256.0 * intensity.clamp(gamma)) as u8
            })
            .collect()
    }

    fn png_fullpath(&self, path: &str) -> PathBuf {
        // If the provided path is a folder, place <name>.png under it,
        // otherwise use the path as given (forcing a .png extension)
        let path = Path::new(path);
        let mut fullpath = path.to_path_buf();
        if path.is_dir() {
            fullpath = path.join(&self.name);
        }
        if fullpath.extension().and_then(|e| e.to_str()) != Some("png") {
            fullpath.set_extension("png");
        }
        fullpath
    }

    pub fn save_png(self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let fullpath = self.png_fullpath(path);

        let file = File::create(&fullpath)?;
        let w = &mut BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;

        let data = self.to_rgb();
        writer.write_image_data(&data)?;
        info!("Image saved to {}", fullpath.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_tile_writes_land_in_place() {
        let fb = FrameBuffer::new(8);
        {
            // Disjoint ranges, one "job" each
            let front = unsafe { fb.tile_mut(0..4) };
            for (i, px) in front.iter_mut().enumerate() {
                *px = Vector3::splat(i as Float);
            }
            let back = unsafe { fb.tile_mut(4..8) };
            for (i, px) in back.iter_mut().enumerate() {
                *px = Vector3::splat((i + 4) as Float);
            }
        }
        let pixels = fb.into_pixels();
        for (i, px) in pixels.iter().enumerate() {
            assert_eq!(*px, Vector3::splat(i as Float));
        }
    }

    #[test]
    fn test_to_rgb_gamma_and_clamp() {
        let im = ImageData::new(
            2,
            1,
            "t".to_string(),
            vec![Vector3::new(0.25, 1.0, 4.0), Vector3::new(-1.0, 0.0, 1.0)],
        );
        let rgb = im.to_rgb();
        assert_eq!(rgb.len(), 6);
        assert_eq!(rgb[0], 128); // sqrt(0.25) = 0.5
        assert_eq!(rgb[1], 255); // clamped below 1.0
        assert_eq!(rgb[2], 255); // overbright clamps too
        assert_eq!(rgb[3], 0); // negative clamps to black
    }
}
