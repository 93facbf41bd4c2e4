// SPDX-License-Identifier: GPL-3.0-only

//! CPU reference backend

use super::{FrameLuminance, LuminanceBackend};
use crate::errors::ExposureResult;
use crate::filter_pos::{self, FilterPosField};
use crate::frame::HdrImage;
use crate::luminance::{AverageParams, HistogramParams, build_histogram, reduce_histogram};
use tracing::trace;

#[derive(Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl LuminanceBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn measure_frame(
        &mut self,
        image: &HdrImage,
        histogram_params: &HistogramParams,
        average_params: &AverageParams,
        previous_adapted: f32,
    ) -> ExposureResult<FrameLuminance> {
        histogram_params.check_image(image)?;
        let histogram = build_histogram(image, histogram_params);
        let reduced = reduce_histogram(&histogram, average_params, previous_adapted);
        trace!(
            average = reduced.average,
            adapted = reduced.adapted,
            "CPU luminance pass complete"
        );

        Ok(FrameLuminance {
            histogram,
            average_luminance: reduced.average,
            adapted_luminance: reduced.adapted,
        })
    }

    fn lerp_positions(
        &mut self,
        srce: &mut FilterPosField,
        dest: &FilterPosField,
        lerp_factor: f32,
    ) -> ExposureResult<()> {
        filter_pos::lerp_positions(srce, dest, lerp_factor)
    }
}
