/*

    Image texture sampled by uv at shading time.

*/

use std::path::Path;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Texture {
    pixels: Vec<Vector3>, // linear [0,1] RGB, row-major
    width: usize,
    height: usize,
}

impl Texture {

    pub fn load(path: &Path) -> Result<Self, image::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);

        let pixels = rgba
            .pixels()
            .map(|p| {
                Vector3::new(
                    p[0] as Float / 255.0,
                    p[1] as Float / 255.0,
                    p[2] as Float / 255.0,
                )
            })
            .collect();

        debug!("loaded {width}x{height} texture from {}", path.display());
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    #[cfg(test)]
    fn from_pixels(pixels: Vec<Vector3>, width: usize, height: usize) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Nearest-pixel lookup. v grows upwards in texture space, so the row
    /// index is flipped. Out-of-range uv clamps to the border.
    pub fn sample(&self, u: Float, v: Float) -> Vector3 {
        if self.width == 0 || self.height == 0 {
            return Vector3::new(1.0, 0.0, 1.0); // debug magenta
        }

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let x = ((u * self.width as Float) as usize).min(self.width - 1);
        let y = ((v * self.height as Float) as usize).min(self.height - 1);
        self.pixels[y * self.width + x]
    }
}
