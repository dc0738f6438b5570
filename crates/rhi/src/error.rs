//! RHI-specific error types.

use thiserror::Error;

use crate::image::ImageLayoutState;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(gpu_allocator::AllocationError),

    /// Device memory exhausted while creating a resource
    #[error("Out of device memory allocating {what} ({size} bytes)")]
    ResourceExhausted {
        /// What was being allocated.
        what: &'static str,
        /// Requested size in bytes.
        size: u64,
    },

    /// Malformed caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Illegal image layout transition request
    #[error("Unsupported image layout transition: {from:?} -> {to:?}")]
    UnsupportedTransition {
        /// Layout the image is currently in.
        from: ImageLayoutState,
        /// Layout that was requested.
        to: ImageLayoutState,
    },

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Surface creation error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Shader module error
    #[error("Shader error: {0}")]
    Shader(String),
}

impl From<gpu_allocator::AllocationError> for RhiError {
    fn from(err: gpu_allocator::AllocationError) -> Self {
        RhiError::Allocator(err)
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
