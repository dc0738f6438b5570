//! Error types for resource loading.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for resource loading operations.
///
/// Every variant means the asset failed to load; callers get no partially
/// constructed resource alongside one of these.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Failed to parse OBJ data.
    #[error("failed to parse OBJ data: {0}")]
    ObjParse(String),

    /// The OBJ source parsed but contains no usable geometry.
    #[error("OBJ source contains no geometry")]
    EmptyMesh,

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A raw pixel buffer does not match its stated dimensions.
    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    PixelSizeMismatch {
        /// Stated width in pixels.
        width: u32,
        /// Stated height in pixels.
        height: u32,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
