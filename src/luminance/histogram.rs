// SPDX-License-Identifier: GPL-3.0-only

//! Log-luminance histogram builder (CPU reference)
//!
//! Mirrors `lum_histogram.wgsl`: the image is split into 16x16 tiles, each
//! tile counts into its own local histogram and then adds it to the global
//! histogram with atomic adds.

use crate::config::LogLumRange;
use crate::constants::{
    BIN_SCALE, HISTOGRAM_BIN_COUNT, LUMINANCE_EPSILON, RGB_TO_LUM, WORKGROUP_DIM,
};
use crate::errors::{ExposureError, ExposureResult};
use crate::frame::HdrImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Uniform parameters of the histogram pass
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HistogramParams {
    pub min_log_lum: f32,
    pub inverse_log_lum_range: f32,
    pub width: u32,
    pub height: u32,
}

impl HistogramParams {
    pub fn new(range: &LogLumRange, width: u32, height: u32) -> Self {
        Self {
            min_log_lum: range.min_log_lum,
            inverse_log_lum_range: range.inverse_range(),
            width,
            height,
        }
    }

    /// Fail unless these parameters describe `image`
    ///
    /// The GPU pass dispatches over `width`x`height`, so a mismatch would
    /// count texels that are not part of the frame.
    pub fn check_image(&self, image: &HdrImage) -> ExposureResult<()> {
        if self.width != image.width() || self.height != image.height() {
            return Err(ExposureError::InvalidInput(format!(
                "histogram parameters are {}x{} but the frame is {}x{}",
                self.width,
                self.height,
                image.width(),
                image.height()
            )));
        }
        Ok(())
    }
}

/// 256 pixel counts bucketed by log luminance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuminanceHistogram {
    pub bins: Vec<u32>,
}

impl Default for LuminanceHistogram {
    fn default() -> Self {
        Self {
            bins: vec![0; HISTOGRAM_BIN_COUNT],
        }
    }
}

impl LuminanceHistogram {
    pub fn from_bins(bins: Vec<u32>) -> Self {
        debug_assert_eq!(bins.len(), HISTOGRAM_BIN_COUNT);
        Self { bins }
    }

    /// Sum of all bins
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| c as u64).sum()
    }

    /// Index of the fullest bin (lowest index on ties)
    pub fn peak_bin(&self) -> usize {
        self.bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// Rec. 709 luminance of a linear RGB color
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * RGB_TO_LUM[0] + rgb[1] * RGB_TO_LUM[1] + rgb[2] * RGB_TO_LUM[2]
}

/// Histogram bin for a color
///
/// Near-black (and NaN) goes to bin 0; everything else maps the clamped
/// log2 luminance onto bins 1..=255.
#[inline]
pub fn color_to_bin(rgb: [f32; 3], min_log_lum: f32, inverse_log_lum_range: f32) -> u32 {
    let lum = luminance(rgb);
    if !(lum >= LUMINANCE_EPSILON) {
        return 0;
    }

    let log_lum = ((lum.log2() - min_log_lum) * inverse_log_lum_range).clamp(0.0, 1.0);
    (log_lum * BIN_SCALE + 1.0) as u32
}

/// Build the histogram of `image`
pub fn build_histogram(image: &HdrImage, params: &HistogramParams) -> LuminanceHistogram {
    let global: Vec<AtomicU32> = (0..HISTOGRAM_BIN_COUNT).map(|_| AtomicU32::new(0)).collect();

    // Never read past the pixels actually present
    let width = params.width.min(image.width());
    let height = params.height.min(image.height());
    let groups_x = width.div_ceil(WORKGROUP_DIM);
    let groups_y = height.div_ceil(WORKGROUP_DIM);

    (0..groups_x * groups_y).into_par_iter().for_each(|group| {
        let group_x = group % groups_x;
        let group_y = group / groups_x;
        let mut shared = [0u32; HISTOGRAM_BIN_COUNT];

        for local_y in 0..WORKGROUP_DIM {
            for local_x in 0..WORKGROUP_DIM {
                let x = group_x * WORKGROUP_DIM + local_x;
                let y = group_y * WORKGROUP_DIM + local_y;
                // Threads beyond the image bounds skip work
                if x >= width || y >= height {
                    continue;
                }
                let [r, g, b, _] = image.get(x, y);
                let bin = color_to_bin([r, g, b], params.min_log_lum, params.inverse_log_lum_range);
                shared[bin as usize] += 1;
            }
        }

        // Different tiles may hit the same bin
        for (bin, count) in shared.iter().enumerate() {
            if *count > 0 {
                global[bin].fetch_add(*count, Ordering::Relaxed);
            }
        }
    });

    LuminanceHistogram::from_bins(global.into_iter().map(AtomicU32::into_inner).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params(width: u32, height: u32) -> HistogramParams {
        HistogramParams::new(&LogLumRange::new(-9.0, 3.5), width, height)
    }

    #[test]
    fn test_black_goes_to_bin_zero() {
        assert_eq!(color_to_bin([0.0, 0.0, 0.0], -9.0, 1.0 / 12.5), 0);
        assert_eq!(color_to_bin([0.004, 0.004, 0.004], -9.0, 1.0 / 12.5), 0);
        assert_eq!(color_to_bin([f32::NAN, 0.0, 0.0], -9.0, 1.0 / 12.5), 0);
    }

    #[test]
    fn test_bins_clamp_to_range() {
        // Just above epsilon but below min_log_lum clamps to bin 1
        assert_eq!(color_to_bin([0.01, 0.01, 0.01], -2.0, 1.0 / 4.0), 1);
        assert_eq!(color_to_bin([1.0e6, 1.0e6, 1.0e6], -9.0, 1.0 / 12.5), 255);
        assert_eq!(color_to_bin([f32::INFINITY, 0.0, 0.0], -9.0, 1.0 / 12.5), 255);
    }

    #[test]
    fn test_mid_gray_bin() {
        // log2(0.5) = -1 -> (8 / 12.5) * 254 + 1 = 163.56
        assert_eq!(color_to_bin([0.5, 0.5, 0.5], -9.0, 1.0 / 12.5), 163);
    }

    #[test]
    fn test_uniform_image_is_single_spike() {
        let image = HdrImage::filled(40, 24, [0.5, 0.5, 0.5, 1.0]);
        let histogram = build_histogram(&image, &default_params(40, 24));
        assert_eq!(histogram.bins[163], 40 * 24);
        assert_eq!(histogram.total(), 40 * 24);
        assert_eq!(histogram.peak_bin(), 163);
    }

    #[test]
    fn test_partial_tiles_counted_once() {
        let image = HdrImage::filled(17, 33, [2.0, 2.0, 2.0, 1.0]);
        let histogram = build_histogram(&image, &default_params(17, 33));
        assert_eq!(histogram.total(), 17 * 33);
    }

    #[test]
    fn test_params_must_match_image() {
        let image = HdrImage::filled(16, 16, [0.5, 0.5, 0.5, 1.0]);
        assert!(default_params(16, 16).check_image(&image).is_ok());
        assert!(matches!(
            default_params(32, 16).check_image(&image),
            Err(ExposureError::InvalidInput(_))
        ));
        assert!(default_params(16, 8).check_image(&image).is_err());
    }

    #[test]
    fn test_empty_image() {
        let image = HdrImage::filled(0, 0, [1.0; 4]);
        let histogram = build_histogram(&image, &default_params(0, 0));
        assert_eq!(histogram.total(), 0);
        assert_eq!(histogram.bins.len(), HISTOGRAM_BIN_COUNT);
    }
}
