use crate::coords::Vec2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("bitmap {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// CPU-side RGBA8 image, straight alpha, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(TextureError::InvalidDimensions {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Builds a bitmap by evaluating `f` at every texel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel at `(x, y)`; coordinates are clamped to the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    /// Nearest-texel lookup for `uv` in `[0, 1]²` (top-left origin).
    /// Callers handle out-of-range uvs; they are clamped here.
    pub fn sample_nearest(&self, uv: Vec2) -> [u8; 4] {
        let fx = (uv.x.clamp(0.0, 1.0) * self.width as f32).floor() as u32;
        let fy = (uv.y.clamp(0.0, 1.0) * self.height as f32).floor() as u32;
        self.pixel(fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_length() {
        let err = Bitmap::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            TextureError::InvalidDimensions { width: 2, height: 2, expected: 16, actual: 15 }
        );
    }

    #[test]
    fn from_fn_is_row_major() {
        let bmp = Bitmap::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(bmp.pixel(2, 1), [2, 1, 0, 255]);
        assert_eq!(bmp.pixels().len(), 24);
    }

    #[test]
    fn sample_nearest_hits_expected_texel() {
        let bmp = Bitmap::from_fn(4, 4, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(bmp.sample_nearest(Vec2::new(0.6, 0.1)), [2, 0, 0, 255]);
        // uv == 1.0 clamps onto the last texel.
        assert_eq!(bmp.sample_nearest(Vec2::new(1.0, 1.0)), [3, 3, 0, 255]);
    }
}
