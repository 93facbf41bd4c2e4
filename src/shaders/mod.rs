// SPDX-License-Identifier: GPL-3.0-only
//! WGSL kernels and the wgpu pipelines that drive them
//!
//! - `lum_histogram.wgsl`: log-luminance histogram (16x16 workgroups)
//! - `lum_average.wgsl`: histogram reduction and luminance adaptation
//! - `filter_pos_update.wgsl`: filter position interpolation

mod filter_pos_pipeline;
pub mod gpu_helpers;
mod gpu_processor;
mod luminance_pipeline;

pub use filter_pos_pipeline::{FILTER_POS_SHADER, FilterPosPipeline};
pub use gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_async};
pub use luminance_pipeline::{
    AVERAGE_SHADER, GpuFrameLuminance, HISTOGRAM_SHADER, LuminancePipeline, check_gpu_frame,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Validate that a WGSL shader compiles successfully using naga
    fn validate_shader(name: &str, source: &str) {
        let result = naga::front::wgsl::parse_str(source);
        match result {
            Ok(module) => {
                let info = naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::all(),
                )
                .validate(&module);

                if let Err(e) = info {
                    panic!("Shader '{}' validation failed: {:?}", name, e);
                }
            }
            Err(e) => {
                panic!("Shader '{}' parse failed: {:?}", name, e);
            }
        }
    }

    #[test]
    fn test_histogram_shader_validates() {
        validate_shader("lum_histogram", HISTOGRAM_SHADER);
    }

    #[test]
    fn test_average_shader_validates() {
        validate_shader("lum_average", AVERAGE_SHADER);
    }

    #[test]
    fn test_filter_pos_shader_validates() {
        validate_shader("filter_pos_update", FILTER_POS_SHADER);
    }

    #[test]
    fn test_shaders_match_host_constants() {
        // Rec. 709 weights and epsilon must agree with crate::constants
        assert!(HISTOGRAM_SHADER.contains("0.2125, 0.7154, 0.0721"));
        assert!(HISTOGRAM_SHADER.contains("EPSILON: f32 = 0.005"));
        assert!(HISTOGRAM_SHADER.contains("@workgroup_size(16, 16, 1)"));
        assert!(AVERAGE_SHADER.contains("@workgroup_size(256, 1, 1)"));
        assert!(HISTOGRAM_SHADER.contains("254.0") && AVERAGE_SHADER.contains("254.0"));
    }

    #[test]
    fn test_uniform_structs_are_16_bytes() {
        use crate::filter_pos::FilterPosParams;
        use crate::luminance::{AverageParams, HistogramParams};
        assert_eq!(std::mem::size_of::<HistogramParams>(), 16);
        assert_eq!(std::mem::size_of::<AverageParams>(), 16);
        assert_eq!(std::mem::size_of::<FilterPosParams>(), 16);
    }
}
