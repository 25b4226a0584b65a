//! Error types for index construction and configuration loading.

use thiserror::Error;

/// Errors that can occur while building an index or loading its configuration.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("Region bounds must be finite, got ({min_x}, {min_y}) .. ({max_x}, {max_y})")]
    NonFiniteRegion {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },

    #[error("Region must have positive extent, got {width}x{height}")]
    EmptyRegion { width: f32, height: f32 },

    #[error("Node capacity must be at least 1")]
    ZeroCapacity,

    #[error("Minimum subdivisible extent must be finite and positive, got {0}")]
    InvalidMinExtent(f32),

    #[error("Failed to access config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
