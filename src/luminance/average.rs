// SPDX-License-Identifier: GPL-3.0-only

//! Histogram-to-average-luminance reducer (CPU reference)
//!
//! Mirrors `lum_average.wgsl`: one "thread" per bin weights its count by the
//! bin index, a shared-array tree reduction sums the weights, and thread 0
//! turns the weighted mean bin back into linear luminance before blending it
//! with the previous frame's adapted value.

use super::histogram::LuminanceHistogram;
use crate::config::LogLumRange;
use crate::constants::{BIN_SCALE, GROUP_SIZE, HISTOGRAM_BIN_COUNT};

/// Uniform parameters of the average pass
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AverageParams {
    pub min_log_lum: f32,
    pub log_lum_range: f32,
    pub time_coeff: f32,
    pub num_pixels: f32,
}

impl AverageParams {
    pub fn new(range: &LogLumRange, time_coeff: f32, num_pixels: u64) -> Self {
        Self {
            min_log_lum: range.min_log_lum,
            log_lum_range: range.range(),
            time_coeff,
            num_pixels: num_pixels as f32,
        }
    }
}

/// Output of one reduction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReducedLuminance {
    /// This frame's histogram-weighted linear luminance
    pub average: f32,
    /// Exponential moving average including this frame
    pub adapted: f32,
}

/// Blend weight of the new frame: `1 - exp(-frame_time * tau)`, clamped to [0, 1]
///
/// `0 * inf` yields 0 rather than NaN.
pub fn time_coefficient(frame_time: f32, tau: f32) -> f32 {
    let coeff = 1.0 - (-frame_time * tau).exp();
    if coeff.is_nan() {
        return 0.0;
    }
    coeff.clamp(0.0, 1.0)
}

/// Sum of `count[i] * i` computed the way a 256-thread workgroup does it
pub fn weighted_bin_sum(histogram: &LuminanceHistogram) -> u64 {
    let mut shared = [0u64; HISTOGRAM_BIN_COUNT];
    for (index, count) in histogram.bins.iter().enumerate() {
        shared[index] = *count as u64 * index as u64;
    }

    let mut cutoff = GROUP_SIZE as usize >> 1;
    while cutoff > 0 {
        for index in 0..cutoff {
            shared[index] += shared[index + cutoff];
        }
        cutoff >>= 1;
    }

    shared[0]
}

/// Reduce `histogram` and blend with `last_adapted`
pub fn reduce_histogram(
    histogram: &LuminanceHistogram,
    params: &AverageParams,
    last_adapted: f32,
) -> ReducedLuminance {
    let weighted_sum = weighted_bin_sum(histogram);
    let black_count = histogram.bins.first().copied().unwrap_or(0);

    // Bin 0 holds near-black pixels and is left out of the mean
    let weighted_log_average =
        (weighted_sum as f32 / (params.num_pixels - black_count as f32).max(1.0)) - 1.0;
    let average =
        ((weighted_log_average / BIN_SCALE) * params.log_lum_range + params.min_log_lum).exp2();
    let adapted = last_adapted + (average - last_adapted) * params.time_coeff;

    ReducedLuminance { average, adapted }
}
