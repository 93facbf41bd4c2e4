// SPDX-License-Identifier: GPL-3.0-only

//! Kernel-wide constants
//!
//! These values are mirrored in the WGSL sources under `src/shaders/` and
//! must stay in sync with them.

/// Number of log-luminance histogram bins
pub const HISTOGRAM_BIN_COUNT: usize = 256;

/// Threads per workgroup for the histogram and average passes (one per bin)
pub const GROUP_SIZE: u32 = 256;

/// Workgroup width/height for image-space passes
pub const WORKGROUP_DIM: u32 = 16;

/// Luminance below which a pixel lands in bin 0 (avoids log2 of zero)
pub const LUMINANCE_EPSILON: f32 = 0.005;

/// Rec. 709 luminance weights (RTR 4th ed., p. 278)
pub const RGB_TO_LUM: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Highest bin index offset: log luminance in [0, 1] maps to bins [1, 255]
pub const BIN_SCALE: f32 = 254.0;

/// Default log2 range of the histogram pass
pub const DEFAULT_HISTOGRAM_MIN_LOG_LUM: f32 = -9.0;
pub const DEFAULT_HISTOGRAM_MAX_LOG_LUM: f32 = 3.5;

/// Default log2 range of the average pass
pub const DEFAULT_AVERAGE_MIN_LOG_LUM: f32 = -8.0;
pub const DEFAULT_AVERAGE_MAX_LOG_LUM: f32 = 3.5;

/// Adaptation speed used by the time coefficient
pub const DEFAULT_ADAPTATION_TAU: f32 = 1.1;

/// Frame time fed to the time coefficient when none is measured
pub const DEFAULT_FRAME_TIME_SECS: f32 = 2.0;

/// Middle gray target for the final exposure
pub const DEFAULT_KEY_VALUE: f32 = 0.18;

/// Guards the exposure division against a zero adapted luminance
pub const EXPOSURE_EPSILON: f32 = 0.0001;

/// Normalized filter coordinate range
pub const FILTER_POS_MIN_COORD: f32 = -2.0;
pub const FILTER_POS_MAX_COORD: f32 = 2.0;
pub const FILTER_POS_COORD_WIDTH: f32 = FILTER_POS_MAX_COORD - FILTER_POS_MIN_COORD;

/// Destination position slots rotated by the filter buffers
pub const NUM_FILTER_POS_SLOTS: usize = 3;

/// Largest pixel count whose weighted bin sum fits the GPU's u32 reduction
pub const MAX_GPU_REDUCTION_PIXELS: u64 = u32::MAX as u64 / (HISTOGRAM_BIN_COUNT as u64 - 1);

/// Channel value above which a pixel is listed in luminance reports
pub const REPORT_CUTOFF: f32 = 1.0;
