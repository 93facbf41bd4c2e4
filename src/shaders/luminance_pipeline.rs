// SPDX-License-Identifier: GPL-3.0-only
//! GPU log-luminance histogram and auto-exposure pipeline
//!
//! Two compute passes share one command buffer:
//! 1. `histogram_pass` bins every pixel of the HDR frame by log luminance
//! 2. `average_pass` reduces the histogram to an average luminance and blends
//!    it into the adapted luminance
//!
//! The adapted luminance is written into the luminance buffer before every
//! frame, so the caller stays the owner of the cross-frame state.

use super::gpu_helpers::{
    BindingKind, create_layout, create_pipeline, create_shader, create_staging_buffer,
    create_uniform_buffer,
};
use super::gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_async};
use crate::constants::{HISTOGRAM_BIN_COUNT, MAX_GPU_REDUCTION_PIXELS, WORKGROUP_DIM};
use crate::errors::{ExposureError, ExposureResult, GpuError};
use crate::frame::HdrImage;
use crate::gpu::{self, GpuDeviceInfo, wgpu};
use crate::luminance::{AverageParams, HistogramParams, LuminanceHistogram};
use std::sync::Arc;
use tracing::{debug, info};

/// WGSL source of the histogram pass
pub const HISTOGRAM_SHADER: &str = include_str!("lum_histogram.wgsl");
/// WGSL source of the average pass
pub const AVERAGE_SHADER: &str = include_str!("lum_average.wgsl");

const HISTOGRAM_BYTES: u64 = (HISTOGRAM_BIN_COUNT * std::mem::size_of::<u32>()) as u64;
/// `[adapted, frame_average]`
const LUMINANCE_BYTES: u64 = 2 * std::mem::size_of::<f32>() as u64;

/// Fail if a `width`x`height` frame cannot go through the GPU passes
///
/// The average pass sums `count * bin` in u32, which bounds the pixel
/// count; the input texture is bounded by the device's 2D texture limit.
pub fn check_gpu_frame(width: u32, height: u32, max_texture_dim: u32) -> ExposureResult<()> {
    let pixels = width as u64 * height as u64;
    if pixels > MAX_GPU_REDUCTION_PIXELS {
        return Err(GpuError::TooManyPixels {
            pixels,
            max: MAX_GPU_REDUCTION_PIXELS,
        }
        .into());
    }

    if width > max_texture_dim || height > max_texture_dim {
        return Err(ExposureError::InvalidInput(format!(
            "{}x{} frame exceeds the GPU texture limit of {}",
            width, height, max_texture_dim
        )));
    }
    Ok(())
}

/// Read back from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct GpuFrameLuminance {
    pub histogram: LuminanceHistogram,
    pub average: f32,
    pub adapted: f32,
}

/// GPU histogram + average pipeline
pub struct LuminancePipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    info: GpuDeviceInfo,
    histogram_pipeline: wgpu::ComputePipeline,
    average_pipeline: wgpu::ComputePipeline,
    histogram_layout: wgpu::BindGroupLayout,
    average_bind_group: wgpu::BindGroup,
    histogram_uniform: wgpu::Buffer,
    average_uniform: wgpu::Buffer,
    histogram_buffer: wgpu::Buffer,
    luminance_buffer: wgpu::Buffer,
    histogram_staging: wgpu::Buffer,
    luminance_staging: wgpu::Buffer,
    // Cached resources for current dimensions
    dimensions: CachedDimensions,
    input_texture: Option<wgpu::Texture>,
}

impl LuminancePipeline {
    /// Create the pipeline on a new compute device
    pub async fn new() -> ExposureResult<Self> {
        info!("Initializing GPU luminance pipeline");

        let (device, queue, gpu_info) =
            gpu::create_compute_device("luminance_pipeline_gpu").await?;

        info!(
            adapter_name = %gpu_info.adapter_name,
            adapter_backend = ?gpu_info.backend,
            "GPU device created for luminance pipeline"
        );

        Ok(Self::with_device(device, queue, gpu_info))
    }

    /// Create the pipeline on an existing device
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        info: GpuDeviceInfo,
    ) -> Self {
        let histogram_shader = create_shader(&device, "lum_histogram_shader", HISTOGRAM_SHADER);
        let average_shader = create_shader(&device, "lum_average_shader", AVERAGE_SHADER);

        let histogram_layout = create_layout(
            &device,
            "lum_histogram_bind_group_layout",
            &[
                BindingKind::TextureUnfilterable,
                BindingKind::StorageReadWrite,
                BindingKind::Uniform,
            ],
        );
        let average_layout = create_layout(
            &device,
            "lum_average_bind_group_layout",
            &[
                BindingKind::StorageRead,
                BindingKind::StorageReadWrite,
                BindingKind::Uniform,
            ],
        );

        let histogram_pipeline = create_pipeline(
            &device,
            "lum_histogram_pipeline",
            &histogram_layout,
            &histogram_shader,
            "histogram_pass",
        );
        let average_pipeline = create_pipeline(
            &device,
            "lum_average_pipeline",
            &average_layout,
            &average_shader,
            "average_pass",
        );

        let histogram_uniform =
            create_uniform_buffer::<HistogramParams>(&device, "lum_histogram_uniform");
        let average_uniform = create_uniform_buffer::<AverageParams>(&device, "lum_average_uniform");

        // 256 u32 bins, cleared at the start of every frame
        let histogram_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lum_histogram_buffer"),
            size: HISTOGRAM_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let luminance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lum_adapted_buffer"),
            size: LUMINANCE_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let histogram_staging =
            create_staging_buffer(&device, "lum_histogram_staging", HISTOGRAM_BYTES);
        let luminance_staging =
            create_staging_buffer(&device, "lum_adapted_staging", LUMINANCE_BYTES);

        // Nothing in the average bind group depends on frame size
        let average_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lum_average_bind_group"),
            layout: &average_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: histogram_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: luminance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: average_uniform.as_entire_binding(),
                },
            ],
        });

        Self {
            device,
            queue,
            info,
            histogram_pipeline,
            average_pipeline,
            histogram_layout,
            average_bind_group,
            histogram_uniform,
            average_uniform,
            histogram_buffer,
            luminance_buffer,
            histogram_staging,
            luminance_staging,
            dimensions: CachedDimensions::default(),
            input_texture: None,
        }
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        &self.info
    }

    /// Ensure the input texture matches the frame dimensions
    fn ensure_resources(&mut self, width: u32, height: u32) {
        if !self.dimensions.needs_update(width, height) && self.input_texture.is_some() {
            return;
        }

        debug!(width, height, "Allocating luminance pipeline resources");

        self.input_texture = Some(self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lum_input_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }));

        self.dimensions.update(width, height);
    }

    fn check_frame(&self, image: &HdrImage) -> ExposureResult<()> {
        check_gpu_frame(
            image.width(),
            image.height(),
            self.device.limits().max_texture_dimension_2d,
        )
    }

    /// Run both passes on `image`
    ///
    /// `previous_adapted` is the adapted luminance of the previous frame.
    /// The histogram and average parameters must describe `image`.
    pub async fn measure(
        &mut self,
        image: &HdrImage,
        histogram_params: &HistogramParams,
        average_params: &AverageParams,
        previous_adapted: f32,
    ) -> ExposureResult<GpuFrameLuminance> {
        if image.is_empty() {
            return Err(ExposureError::InvalidInput(
                "cannot upload an empty frame".to_string(),
            ));
        }
        histogram_params.check_image(image)?;
        self.check_frame(image)?;
        self.ensure_resources(image.width(), image.height());

        let input_texture = self
            .input_texture
            .as_ref()
            .ok_or(GpuError::ResourceMissing("luminance input texture"))?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: input_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width() * std::mem::size_of::<[f32; 4]>() as u32),
                rows_per_image: Some(image.height()),
            },
            wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
        );

        self.queue.write_buffer(
            &self.histogram_uniform,
            0,
            bytemuck::bytes_of(histogram_params),
        );
        self.queue
            .write_buffer(&self.average_uniform, 0, bytemuck::bytes_of(average_params));
        self.queue.write_buffer(
            &self.luminance_buffer,
            0,
            bytemuck::cast_slice(&[previous_adapted, 0.0f32]),
        );

        let texture_view = input_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let histogram_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lum_histogram_bind_group"),
            layout: &self.histogram_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.histogram_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.histogram_uniform.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("luminance_encoder"),
            });

        encoder.clear_buffer(&self.histogram_buffer, 0, None);

        // Pass 1: build histogram
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("lum_histogram_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.histogram_pipeline);
            pass.set_bind_group(0, &histogram_bind_group, &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(image.width(), WORKGROUP_DIM),
                compute_dispatch_size(image.height(), WORKGROUP_DIM),
                1,
            );
        }

        // Pass 2: reduce to average and adapt (single workgroup of 256 threads)
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("lum_average_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.average_pipeline);
            pass.set_bind_group(0, &self.average_bind_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }

        encoder.copy_buffer_to_buffer(
            &self.histogram_buffer,
            0,
            &self.histogram_staging,
            0,
            HISTOGRAM_BYTES,
        );
        encoder.copy_buffer_to_buffer(
            &self.luminance_buffer,
            0,
            &self.luminance_staging,
            0,
            LUMINANCE_BYTES,
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let histogram_bytes = read_buffer_async(&self.device, &self.histogram_staging).await?;
        let luminance_bytes = read_buffer_async(&self.device, &self.luminance_staging).await?;

        let bins: Vec<u32> = histogram_bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let luminance: Vec<f32> = luminance_bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let (adapted, average) = match luminance.as_slice() {
            [adapted, average] => (*adapted, *average),
            _ => return Err(GpuError::BufferMap("short luminance readback".to_string()).into()),
        };

        debug!(
            width = image.width(),
            height = image.height(),
            average,
            adapted,
            "GPU luminance pass complete"
        );

        Ok(GpuFrameLuminance {
            histogram: LuminanceHistogram::from_bins(bins),
            average,
            adapted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_within_limits() {
        assert!(check_gpu_frame(1920, 1080, 8192).is_ok());
        assert!(check_gpu_frame(8192, 1, 8192).is_ok());
    }

    #[test]
    fn test_frame_over_texture_limit() {
        assert!(matches!(
            check_gpu_frame(8193, 16, 8192),
            Err(ExposureError::InvalidInput(_))
        ));
        assert!(check_gpu_frame(16, 8193, 8192).is_err());
    }

    #[test]
    fn test_frame_over_reduction_limit() {
        // The limit is u32::MAX / 255 = 16_843_009 pixels
        let side = 4200u32;
        assert!(side as u64 * side as u64 > MAX_GPU_REDUCTION_PIXELS);
        let result = check_gpu_frame(side, side, u32::MAX);
        assert!(matches!(
            result,
            Err(ExposureError::Gpu(GpuError::TooManyPixels { pixels, max }))
                if pixels == 4200 * 4200 && max == MAX_GPU_REDUCTION_PIXELS
        ));

        assert!(check_gpu_frame(4096, 4096, u32::MAX).is_ok());
    }
}
