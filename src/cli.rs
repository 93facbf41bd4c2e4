// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! Results go to stdout as JSON, one object per line; logs go to stderr.

use exposure_kernels::backends::GpuBackend;
use exposure_kernels::filter_pos::save_positions;
use exposure_kernels::luminance::{AverageParams, HistogramParams, save_luminance_report};
use exposure_kernels::{
    AutoExposure, BackendKind, Config, ExposureResult, ExposureSummary, FilterPosBuffers,
    FilterPosField, HdrImage, create_backend,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct FrameReport<'a> {
    frame: usize,
    path: &'a Path,
    backend: &'static str,
    #[serde(flatten)]
    summary: ExposureSummary,
}

#[derive(Serialize)]
struct HistogramReport<'a> {
    path: &'a Path,
    width: u32,
    height: u32,
    backend: &'static str,
    peak_bin: usize,
    average_luminance: f32,
    bins: &'a [u32],
}

#[derive(Serialize)]
struct WarpReport {
    width: u32,
    height: u32,
    steps: u32,
    backend: &'static str,
    /// Largest remaining distance to the destination
    max_distance: f32,
}

pub struct WarpOptions {
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub lerp: f32,
    pub zoom: f32,
    pub backend: Option<BackendKind>,
    pub dump: Option<PathBuf>,
}

fn print_json<T: Serialize>(value: &T) -> ExposureResult<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Auto exposure over `images` in order
pub fn analyze(
    config_path: Option<&Path>,
    images: &[PathBuf],
    backend: Option<BackendKind>,
    frame_time: Option<f32>,
) -> ExposureResult<()> {
    let config = Config::load_or_default(config_path)?;
    let backend = create_backend(backend.unwrap_or(config.backend))?;
    let mut auto = AutoExposure::new(backend, config)?;

    for (index, path) in images.iter().enumerate() {
        let image = HdrImage::open(path)?;
        let frame = auto.process_frame(&image, frame_time)?;
        print_json(&FrameReport {
            frame: index,
            path,
            backend: auto.backend().name(),
            summary: ExposureSummary::from(&frame),
        })?;
    }

    info!(frames = images.len(), "Analysis complete");
    Ok(())
}

/// Histogram of a single image
pub fn histogram(
    config_path: Option<&Path>,
    path: &Path,
    backend: Option<BackendKind>,
    report: Option<&Path>,
) -> ExposureResult<()> {
    let config = Config::load_or_default(config_path)?;
    let mut backend = create_backend(backend.unwrap_or(config.backend))?;

    let image = HdrImage::open(path)?;
    let histogram_params =
        HistogramParams::new(&config.histogram_range, image.width(), image.height());
    // No adaptation: a zero time coefficient keeps the previous value
    let average_params = AverageParams::new(&config.average_range, 0.0, image.pixel_count());
    info!(
        width = image.width(),
        height = image.height(),
        backend = backend.name(),
        "Building histogram"
    );

    let frame = backend.measure_frame(
        &image,
        &histogram_params,
        &average_params,
        config.initial_adapted_luminance,
    )?;
    let histogram = &frame.histogram;

    if let Some(report) = report {
        save_luminance_report(&image, frame.average_luminance, config.key_value, report)?;
    }

    print_json(&HistogramReport {
        path,
        width: image.width(),
        height: image.height(),
        backend: backend.name(),
        peak_bin: histogram.peak_bin(),
        average_luminance: frame.average_luminance,
        bins: &histogram.bins,
    })
}

/// Animate an identity field toward a zoomed copy
pub fn warp(config_path: Option<&Path>, options: WarpOptions) -> ExposureResult<()> {
    let config = Config::load_or_default(config_path)?;
    let mut backend = create_backend(options.backend.unwrap_or(config.backend))?;

    let mut buffers = FilterPosBuffers::new(options.width, options.height);
    let dest = FilterPosField::identity(options.width, options.height).scaled(options.zoom);
    buffers.queue_dest(dest)?;

    for _ in 0..options.steps {
        buffers.update(options.lerp, &mut backend)?;
    }

    let max_distance = buffers
        .srce()
        .positions
        .iter()
        .zip(&buffers.active_dest().positions)
        .map(|(s, d)| (s[0] - d[0]).hypot(s[1] - d[1]))
        .fold(0.0f32, f32::max);

    if let Some(path) = &options.dump {
        save_positions(buffers.srce(), path)?;
    }

    print_json(&WarpReport {
        width: options.width,
        height: options.height,
        steps: options.steps,
        backend: backend.name(),
        max_distance,
    })
}

#[derive(Serialize)]
struct InfoReport {
    gpu_available: bool,
    adapter_name: Option<String>,
    backend: Option<String>,
    device_type: Option<String>,
    error: Option<String>,
}

/// Report the GPU adapter, or why there is none
pub fn info() -> ExposureResult<()> {
    let report = match GpuBackend::new() {
        Ok(gpu) => {
            let device = gpu.device_info();
            InfoReport {
                gpu_available: true,
                adapter_name: Some(device.adapter_name.clone()),
                backend: Some(format!("{:?}", device.backend)),
                device_type: Some(format!("{:?}", device.device_type)),
                error: None,
            }
        }
        Err(e) => InfoReport {
            gpu_available: false,
            adapter_name: None,
            backend: None,
            device_type: None,
            error: Some(e.to_string()),
        },
    };
    print_json(&report)
}
