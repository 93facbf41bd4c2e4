// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use exposure_kernels::constants::*;

#[test]
fn test_histogram_layout() {
    // One workgroup thread per bin in the average pass
    assert_eq!(HISTOGRAM_BIN_COUNT, 256);
    assert_eq!(GROUP_SIZE as usize, HISTOGRAM_BIN_COUNT);
    assert_eq!(WORKGROUP_DIM * WORKGROUP_DIM, GROUP_SIZE);
    // Bin 0 is reserved, the rest span 1..=255
    assert_eq!(BIN_SCALE as usize, HISTOGRAM_BIN_COUNT - 2);
}

#[test]
fn test_luminance_weights_sum_to_one() {
    let sum: f32 = RGB_TO_LUM.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
}

#[test]
fn test_filter_coordinate_space() {
    assert_eq!(FILTER_POS_COORD_WIDTH, 4.0);
    assert_eq!(NUM_FILTER_POS_SLOTS, 3);
}

#[test]
fn test_gpu_reduction_limit_fits_u32() {
    // Worst case: every pixel in bin 255
    let worst = MAX_GPU_REDUCTION_PIXELS * (HISTOGRAM_BIN_COUNT as u64 - 1);
    assert!(worst <= u32::MAX as u64);
}
