// SPDX-License-Identifier: GPL-3.0-only

//! HDR color frames fed to the luminance kernels

use crate::errors::{ExposureError, ExposureResult};
use std::path::Path;
use tracing::debug;

/// Row-major RGBA float image
///
/// Fields are private so `pixels.len() == width * height` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl HdrImage {
    /// Wrap existing pixels; the length must match the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> ExposureResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ExposureError::InvalidInput(format!(
                "{}x{} image needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Every pixel set to the same color
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Decode any format the `image` crate supports (EXR, Radiance HDR, PNG, ...)
    pub fn open(path: &Path) -> ExposureResult<Self> {
        let decoded = image::open(path)?;
        let rgba = decoded.into_rgba32f();
        let (width, height) = rgba.dimensions();
        debug!(path = %path.display(), width, height, "Decoded HDR frame");

        let pixels = rgba.pixels().map(|p| p.0).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Raw bytes for a Rgba32Float texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(HdrImage::new(4, 4, vec![[0.0; 4]; 15]).is_err());
        assert!(HdrImage::new(4, 4, vec![[0.0; 4]; 16]).is_ok());
    }

    #[test]
    fn test_short_buffer_never_becomes_an_image() {
        // A 4x4 frame with 3 pixels must not reach the kernels
        let result = HdrImage::new(4, 4, vec![[1.0; 4]; 3]);
        assert!(matches!(result, Err(ExposureError::InvalidInput(_))));

        let image = HdrImage::filled(4, 4, [1.0; 4]);
        assert_eq!(image.pixels().len() as u64, image.pixel_count());
        assert_eq!(image.get(3, 3), [1.0; 4]);
    }

    #[test]
    fn test_bytes_cover_all_channels() {
        let image = HdrImage::filled(3, 2, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(image.as_bytes().len(), 3 * 2 * 4 * 4);
        assert_eq!(image.get(2, 1), [1.0, 2.0, 3.0, 4.0]);
    }
}
