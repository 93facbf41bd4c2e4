// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the exposure kernels

use std::fmt;

/// Result type alias using ExposureError
pub type ExposureResult<T> = Result<T, ExposureError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum ExposureError {
    /// GPU setup or readback errors
    Gpu(GpuError),
    /// Image decoding errors
    Image(String),
    /// Configuration errors
    Config(String),
    /// Caller passed data the kernels cannot work with
    InvalidInput(String),
    /// Filesystem errors
    Io(String),
}

/// GPU-specific errors
#[derive(Debug, Clone)]
pub enum GpuError {
    /// No suitable adapter found
    AdapterUnavailable(String),
    /// Device request failed
    DeviceCreation(String),
    /// Mapping a staging buffer for readback failed
    BufferMap(String),
    /// A cached resource was not allocated
    ResourceMissing(&'static str),
    /// Image too large for the u32 reduction
    TooManyPixels { pixels: u64, max: u64 },
}

impl fmt::Display for ExposureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureError::Gpu(e) => write!(f, "GPU error: {}", e),
            ExposureError::Image(msg) => write!(f, "Image error: {}", msg),
            ExposureError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ExposureError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ExposureError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::AdapterUnavailable(msg) => write!(f, "No suitable GPU adapter: {}", msg),
            GpuError::DeviceCreation(msg) => write!(f, "Failed to create GPU device: {}", msg),
            GpuError::BufferMap(msg) => write!(f, "Failed to map buffer: {}", msg),
            GpuError::ResourceMissing(name) => write!(f, "GPU resource not allocated: {}", name),
            GpuError::TooManyPixels { pixels, max } => {
                write!(f, "{} pixels exceeds the GPU reduction limit of {}", pixels, max)
            }
        }
    }
}

impl std::error::Error for ExposureError {}
impl std::error::Error for GpuError {}

impl From<GpuError> for ExposureError {
    fn from(err: GpuError) -> Self {
        ExposureError::Gpu(err)
    }
}

impl From<std::io::Error> for ExposureError {
    fn from(err: std::io::Error) -> Self {
        ExposureError::Io(err.to_string())
    }
}

impl From<image::ImageError> for ExposureError {
    fn from(err: image::ImageError) -> Self {
        ExposureError::Image(err.to_string())
    }
}

impl From<serde_json::Error> for ExposureError {
    fn from(err: serde_json::Error) -> Self {
        ExposureError::Config(err.to_string())
    }
}
