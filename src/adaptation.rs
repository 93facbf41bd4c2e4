// SPDX-License-Identifier: GPL-3.0-only

//! Frame-to-frame auto exposure
//!
//! Owns the adapted luminance that persists between frames and feeds each
//! frame through the histogram and average kernels of a backend.

use crate::backends::{FrameLuminance, LuminanceBackend};
use crate::config::Config;
use crate::errors::{ExposureError, ExposureResult};
use crate::frame::HdrImage;
use crate::luminance::{AverageParams, HistogramParams, final_exposure, time_coefficient};
use serde::Serialize;
use tracing::{debug, trace};

/// Measurement and exposure for one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureFrame {
    pub frame_luminance: FrameLuminance,
    /// Multiplier that brings the adapted luminance to the key value
    pub exposure: f32,
}

/// Compact per-frame summary, as printed by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureSummary {
    pub average_luminance: f32,
    pub adapted_luminance: f32,
    pub exposure: f32,
    pub peak_bin: usize,
}

impl From<&ExposureFrame> for ExposureSummary {
    fn from(frame: &ExposureFrame) -> Self {
        Self {
            average_luminance: frame.frame_luminance.average_luminance,
            adapted_luminance: frame.frame_luminance.adapted_luminance,
            exposure: frame.exposure,
            peak_bin: frame.frame_luminance.histogram.peak_bin(),
        }
    }
}

pub struct AutoExposure<B: LuminanceBackend> {
    backend: B,
    config: Config,
    adapted_luminance: f32,
    frames: u64,
}

impl<B: LuminanceBackend> AutoExposure<B> {
    pub fn new(backend: B, config: Config) -> ExposureResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            adapted_luminance: config.initial_adapted_luminance,
            config,
            frames: 0,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adapted luminance carried into the next frame
    pub fn adapted_luminance(&self) -> f32 {
        self.adapted_luminance
    }

    /// Number of frames processed since creation or the last reset
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self, adapted_luminance: f32) {
        debug!(adapted_luminance, "Resetting adaptation state");
        self.adapted_luminance = adapted_luminance;
        self.frames = 0;
    }

    /// Measure `image` and blend it into the adapted luminance
    ///
    /// `frame_time` is in seconds; `None` uses the configured default.
    /// Empty frames are rejected and leave the state untouched.
    pub fn process_frame(
        &mut self,
        image: &HdrImage,
        frame_time: Option<f32>,
    ) -> ExposureResult<ExposureFrame> {
        if image.is_empty() {
            return Err(ExposureError::InvalidInput(
                "cannot measure an empty frame".to_string(),
            ));
        }

        let frame_time = frame_time.unwrap_or(self.config.frame_time_secs).max(0.0);
        let time_coeff = time_coefficient(frame_time, self.config.adaptation_tau);
        let histogram_params =
            HistogramParams::new(&self.config.histogram_range, image.width(), image.height());
        let average_params =
            AverageParams::new(&self.config.average_range, time_coeff, image.pixel_count());

        let frame_luminance = self.backend.measure_frame(
            image,
            &histogram_params,
            &average_params,
            self.adapted_luminance,
        )?;

        self.adapted_luminance = frame_luminance.adapted_luminance;
        self.frames += 1;
        let exposure = final_exposure(self.adapted_luminance, self.config.key_value);

        trace!(
            backend = self.backend.name(),
            frame = self.frames,
            average = frame_luminance.average_luminance,
            adapted = self.adapted_luminance,
            exposure,
            "Frame processed"
        );

        Ok(ExposureFrame {
            frame_luminance,
            exposure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::CpuBackend;

    fn gray(value: f32) -> HdrImage {
        HdrImage::filled(32, 24, [value, value, value, 1.0])
    }

    #[test]
    fn test_first_frame_starts_from_initial_value() {
        let mut auto = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        assert_eq!(auto.adapted_luminance(), 0.0);

        let frame = auto.process_frame(&gray(0.5), None).unwrap();
        let coeff = time_coefficient(2.0, 1.1);
        let expected = frame.frame_luminance.average_luminance * coeff;
        assert!((auto.adapted_luminance() - expected).abs() < 1e-6);
        assert_eq!(auto.frames_processed(), 1);
    }

    #[test]
    fn test_zero_frame_time_holds_state() {
        let mut auto = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        auto.reset(0.3);
        auto.process_frame(&gray(4.0), Some(0.0)).unwrap();
        assert_eq!(auto.adapted_luminance(), 0.3);
    }

    #[test]
    fn test_converges_toward_scene_average() {
        let mut auto = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        let image = gray(0.5);
        let mut last_gap = f32::INFINITY;
        let mut average = 0.0;
        for _ in 0..8 {
            let frame = auto.process_frame(&image, Some(0.5)).unwrap();
            average = frame.frame_luminance.average_luminance;
            let gap = (average - auto.adapted_luminance()).abs();
            assert!(gap <= last_gap);
            last_gap = gap;
        }
        assert!((auto.adapted_luminance() - average).abs() / average < 0.05);
    }

    #[test]
    fn test_brighter_scene_lowers_exposure() {
        let mut dark = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        let mut bright = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        let dark_frame = dark.process_frame(&gray(0.05), None).unwrap();
        let bright_frame = bright.process_frame(&gray(2.0), None).unwrap();
        assert!(bright_frame.exposure < dark_frame.exposure);
    }

    #[test]
    fn test_empty_frame_rejected_without_state_change() {
        let mut auto = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        auto.reset(0.25);
        let empty = HdrImage::new(0, 0, Vec::new()).unwrap();
        assert!(auto.process_frame(&empty, None).is_err());
        assert_eq!(auto.adapted_luminance(), 0.25);
        assert_eq!(auto.frames_processed(), 0);
    }

    #[test]
    fn test_summary_from_frame() {
        let mut auto = AutoExposure::new(CpuBackend::new(), Config::default()).unwrap();
        let frame = auto.process_frame(&gray(0.18), None).unwrap();
        let summary = ExposureSummary::from(&frame);
        assert_eq!(summary.exposure, frame.exposure);
        assert_eq!(summary.peak_bin, frame.frame_luminance.histogram.peak_bin());
    }
}
