// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction for running the kernels
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   AutoExposure  /  FilterPosBuffers      │
//! └────────────────────┬─────────────────────┘
//!                      │ LuminanceBackend
//!        ┌─────────────┴─────────────┐
//!  ┌─────┴──────┐             ┌──────┴──────┐
//!  │ CpuBackend │             │ GpuBackend  │
//!  │  (rayon)   │             │ (wgpu/WGSL) │
//!  └────────────┘             └─────────────┘
//! ```
//!
//! Both backends implement the same semantics; the CPU one is always
//! available and serves as the reference for the GPU kernels.

mod cpu;
mod gpu;

pub use cpu::CpuBackend;
pub use gpu::GpuBackend;

use crate::config::BackendKind;
use crate::errors::ExposureResult;
use crate::filter_pos::FilterPosField;
use crate::frame::HdrImage;
use crate::luminance::{AverageParams, HistogramParams, LuminanceHistogram};
use tracing::{info, warn};

/// Result of the histogram and average passes for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLuminance {
    pub histogram: LuminanceHistogram,
    /// This frame's histogram-weighted linear luminance
    pub average_luminance: f32,
    /// Adapted luminance after blending this frame in
    pub adapted_luminance: f32,
}

/// Runs the luminance and filter position kernels
pub trait LuminanceBackend {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Histogram + average for one frame, blended with `previous_adapted`
    fn measure_frame(
        &mut self,
        image: &HdrImage,
        histogram_params: &HistogramParams,
        average_params: &AverageParams,
        previous_adapted: f32,
    ) -> ExposureResult<FrameLuminance>;

    /// Move `srce` toward `dest` by `lerp_factor`, in place
    fn lerp_positions(
        &mut self,
        srce: &mut FilterPosField,
        dest: &FilterPosField,
        lerp_factor: f32,
    ) -> ExposureResult<()>;
}

/// Create the backend selected by `kind`
///
/// `Auto` falls back to the CPU when no GPU adapter is available.
pub fn create_backend(kind: BackendKind) -> ExposureResult<Box<dyn LuminanceBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(CpuBackend::new())),
        BackendKind::Gpu => Ok(Box::new(GpuBackend::new()?)),
        BackendKind::Auto => match GpuBackend::new() {
            Ok(backend) => {
                info!("Using GPU backend");
                Ok(Box::new(backend))
            }
            Err(e) => {
                warn!(error = %e, "GPU backend unavailable, falling back to CPU");
                Ok(Box::new(CpuBackend::new()))
            }
        },
    }
}

impl<B: LuminanceBackend + ?Sized> LuminanceBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn measure_frame(
        &mut self,
        image: &HdrImage,
        histogram_params: &HistogramParams,
        average_params: &AverageParams,
        previous_adapted: f32,
    ) -> ExposureResult<FrameLuminance> {
        (**self).measure_frame(image, histogram_params, average_params, previous_adapted)
    }

    fn lerp_positions(
        &mut self,
        srce: &mut FilterPosField,
        dest: &FilterPosField,
        lerp_factor: f32,
    ) -> ExposureResult<()> {
        (**self).lerp_positions(srce, dest, lerp_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_backend_always_created() {
        let backend = create_backend(BackendKind::Cpu).unwrap();
        assert_eq!(backend.name(), "cpu");
    }

    #[test]
    fn test_cpu_backend_rejects_params_for_other_size() {
        use crate::config::LogLumRange;
        use crate::errors::ExposureError;

        let range = LogLumRange::new(-9.0, 3.5);
        let image = HdrImage::filled(16, 16, [0.5, 0.5, 0.5, 1.0]);
        let wide = HistogramParams::new(&range, 32, 16);
        let average = AverageParams::new(&range, 1.0, image.pixel_count());

        let mut backend = CpuBackend::new();
        let result = backend.measure_frame(&image, &wide, &average, 0.0);
        assert!(matches!(result, Err(ExposureError::InvalidInput(_))));

        let exact = HistogramParams::new(&range, 16, 16);
        let frame = backend.measure_frame(&image, &exact, &average, 0.0).unwrap();
        assert_eq!(frame.histogram.total(), 256);
    }

    #[test]
    fn test_auto_backend_never_fails() {
        // Either GPU or the CPU fallback
        let backend = create_backend(BackendKind::Auto).unwrap();
        assert!(matches!(backend.name(), "cpu" | "gpu"));
    }
}
