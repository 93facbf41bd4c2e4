// SPDX-License-Identifier: GPL-3.0-only

//! Exposure multiplier derived from the adapted luminance

use crate::constants::EXPOSURE_EPSILON;

/// Scale that maps `adapted_luminance` onto `key_value` (middle gray)
pub fn final_exposure(adapted_luminance: f32, key_value: f32) -> f32 {
    key_value / (adapted_luminance.max(0.0) + EXPOSURE_EPSILON)
}
