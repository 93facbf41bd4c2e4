// SPDX-License-Identifier: GPL-3.0-only

//! CPU reference implementations of the luminance kernels
//!
//! Each function follows the structure of its WGSL counterpart so the two
//! paths produce the same bins and (within float rounding) the same values.

pub mod average;
pub mod exposure;
pub mod histogram;
pub mod report;

pub use average::{AverageParams, ReducedLuminance, reduce_histogram, time_coefficient};
pub use exposure::final_exposure;
pub use histogram::{HistogramParams, LuminanceHistogram, build_histogram, color_to_bin};
pub use report::{save_luminance_report, write_luminance_report};
