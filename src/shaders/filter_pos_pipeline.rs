// SPDX-License-Identifier: GPL-3.0-only
//! GPU filter position interpolation
//!
//! Uploads the source and destination position fields, runs
//! `filter_pos_update.wgsl` and reads the interpolated source field back.

use super::gpu_helpers::{
    BindingKind, create_layout, create_pipeline, create_shader, create_staging_buffer,
    create_uniform_buffer,
};
use super::gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_async};
use crate::constants::WORKGROUP_DIM;
use crate::errors::{ExposureError, ExposureResult, GpuError};
use crate::filter_pos::{FilterPosField, FilterPosParams, check_dimensions};
use crate::gpu::{self, GpuDeviceInfo, wgpu};
use std::sync::Arc;
use tracing::{debug, info};

/// WGSL source of the filter position pass
pub const FILTER_POS_SHADER: &str = include_str!("filter_pos_update.wgsl");

/// Buffers sized for one field resolution
struct FieldBuffers {
    srce: wgpu::Buffer,
    dest: wgpu::Buffer,
    staging: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: u64,
}

/// GPU filter position pipeline
pub struct FilterPosPipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    info: GpuDeviceInfo,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    dimensions: CachedDimensions,
    buffers: Option<FieldBuffers>,
}

impl FilterPosPipeline {
    pub async fn new() -> ExposureResult<Self> {
        info!("Initializing GPU filter position pipeline");
        let (device, queue, gpu_info) = gpu::create_compute_device("filter_pos_gpu").await?;
        Ok(Self::with_device(device, queue, gpu_info))
    }

    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        info: GpuDeviceInfo,
    ) -> Self {
        let shader = create_shader(&device, "filter_pos_shader", FILTER_POS_SHADER);
        let bind_group_layout = create_layout(
            &device,
            "filter_pos_bind_group_layout",
            &[
                BindingKind::StorageReadWrite,
                BindingKind::StorageRead,
                BindingKind::Uniform,
            ],
        );
        let pipeline = create_pipeline(
            &device,
            "filter_pos_pipeline",
            &bind_group_layout,
            &shader,
            "main",
        );
        let uniform_buffer = create_uniform_buffer::<FilterPosParams>(&device, "filter_pos_uniform");

        Self {
            device,
            queue,
            info,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            dimensions: CachedDimensions::default(),
            buffers: None,
        }
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        &self.info
    }

    fn ensure_resources(&mut self, width: u32, height: u32) {
        if !self.dimensions.needs_update(width, height) && self.buffers.is_some() {
            return;
        }

        debug!(width, height, "Allocating filter position buffers");

        let size = width as u64 * height as u64 * std::mem::size_of::<[f32; 2]>() as u64;
        let srce = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("filter_srce_pos_buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let dest = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("filter_dest_pos_buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let staging = create_staging_buffer(&self.device, "filter_pos_staging", size);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("filter_pos_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: srce.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: dest.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        self.buffers = Some(FieldBuffers {
            srce,
            dest,
            staging,
            bind_group,
            size,
        });
        self.dimensions.update(width, height);
    }

    /// Interpolate `srce` toward `dest` in place
    pub async fn update(
        &mut self,
        srce: &mut FilterPosField,
        dest: &FilterPosField,
        lerp_factor: f32,
    ) -> ExposureResult<()> {
        check_dimensions(srce, dest)?;
        if srce.positions.is_empty() {
            return Ok(());
        }

        let size = srce.as_bytes().len() as u64;
        let max_binding = self.device.limits().max_storage_buffer_binding_size as u64;
        if size > max_binding {
            return Err(ExposureError::InvalidInput(format!(
                "{}x{} position field exceeds the GPU storage binding limit",
                srce.width, srce.height
            )));
        }

        self.ensure_resources(srce.width, srce.height);
        let buffers = self
            .buffers
            .as_ref()
            .ok_or(GpuError::ResourceMissing("filter position buffers"))?;

        self.queue.write_buffer(&buffers.srce, 0, srce.as_bytes());
        self.queue.write_buffer(&buffers.dest, 0, dest.as_bytes());
        let params = FilterPosParams::new(srce.width, srce.height, lerp_factor);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("filter_pos_encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("filter_pos_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &buffers.bind_group, &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(srce.width, WORKGROUP_DIM),
                compute_dispatch_size(srce.height, WORKGROUP_DIM),
                1,
            );
        }

        encoder.copy_buffer_to_buffer(&buffers.srce, 0, &buffers.staging, 0, buffers.size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let bytes = read_buffer_async(&self.device, &buffers.staging).await?;
        for (pos, chunk) in srce.positions.iter_mut().zip(bytes.chunks_exact(8)) {
            pos[0] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            pos[1] = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        }

        debug!(
            width = srce.width,
            height = srce.height,
            lerp_factor,
            "GPU filter position update complete"
        );

        Ok(())
    }
}
