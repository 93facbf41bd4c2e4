// SPDX-License-Identifier: GPL-3.0-only

//! wgpu compute backend
//!
//! Both pipelines share one device. Calls block on GPU readback.

use super::{FrameLuminance, LuminanceBackend};
use crate::errors::ExposureResult;
use crate::filter_pos::FilterPosField;
use crate::frame::HdrImage;
use crate::gpu::{self, GpuDeviceInfo};
use crate::luminance::{AverageParams, HistogramParams};
use crate::shaders::{FilterPosPipeline, LuminancePipeline};
use tracing::info;

pub struct GpuBackend {
    luminance: LuminancePipeline,
    filter_pos: FilterPosPipeline,
}

impl GpuBackend {
    /// Create a device and both pipelines, blocking until ready
    pub fn new() -> ExposureResult<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> ExposureResult<Self> {
        let (device, queue, info) = gpu::create_compute_device("exposure_kernels_gpu").await?;

        info!(
            adapter_name = %info.adapter_name,
            adapter_backend = ?info.backend,
            "GPU backend ready"
        );

        Ok(Self {
            luminance: LuminancePipeline::with_device(device.clone(), queue.clone(), info.clone()),
            filter_pos: FilterPosPipeline::with_device(device, queue, info),
        })
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        self.luminance.device_info()
    }
}

impl LuminanceBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn measure_frame(
        &mut self,
        image: &HdrImage,
        histogram_params: &HistogramParams,
        average_params: &AverageParams,
        previous_adapted: f32,
    ) -> ExposureResult<FrameLuminance> {
        let frame = pollster::block_on(self.luminance.measure(
            image,
            histogram_params,
            average_params,
            previous_adapted,
        ))?;

        Ok(FrameLuminance {
            histogram: frame.histogram,
            average_luminance: frame.average,
            adapted_luminance: frame.adapted,
        })
    }

    fn lerp_positions(
        &mut self,
        srce: &mut FilterPosField,
        dest: &FilterPosField,
        lerp_factor: f32,
    ) -> ExposureResult<()> {
        pollster::block_on(self.filter_pos.update(srce, dest, lerp_factor))
    }
}
