//! Platform layer: windowing and Vulkan surface creation.
//!
//! This crate wraps winit window management and exposes the raw handles
//! needed for Vulkan surface creation.

mod window;

pub use window::{Surface, Window};
