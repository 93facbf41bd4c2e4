// SPDX-License-Identifier: GPL-3.0-only

//! Exposure Kernels - luminance adaptation and filter position compute kernels
//!
//! This library provides the compute side of an HDR visualizer's tone mapping:
//! a log-luminance histogram, its reduction to an adapted scene luminance, and
//! the interpolation of per-texel filter positions.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`luminance`]: CPU reference kernels for the histogram and average passes
//! - [`filter_pos`]: Filter position fields, interpolation and slot rotation
//! - [`shaders`]: WGSL kernels and the wgpu pipelines that run them
//! - [`backends`]: CPU/GPU backend abstraction
//! - [`adaptation`]: Cross-frame auto exposure state
//! - [`config`]: JSON configuration
//!
//! # Example
//!
//! ```ignore
//! use exposure_kernels::{AutoExposure, Config, HdrImage, backends::CpuBackend};
//!
//! let mut auto = AutoExposure::new(CpuBackend::new(), Config::default())?;
//! let frame = auto.process_frame(&HdrImage::open("frame.exr".as_ref())?, None)?;
//! println!("exposure {}", frame.exposure);
//! ```

pub mod adaptation;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter_pos;
pub mod frame;
pub mod gpu;
pub mod luminance;
pub mod shaders;

// Re-export commonly used types
pub use adaptation::{AutoExposure, ExposureFrame, ExposureSummary};
pub use backends::{FrameLuminance, LuminanceBackend, create_backend};
pub use config::{BackendKind, Config, LogLumRange};
pub use errors::{ExposureError, ExposureResult, GpuError};
pub use filter_pos::{FilterPosBuffers, FilterPosField};
pub use frame::HdrImage;
pub use luminance::LuminanceHistogram;
