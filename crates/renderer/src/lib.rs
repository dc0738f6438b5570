//! Frame pipelining and orchestration.
//!
//! This crate drives the per-frame command pipeline:
//! - Per-frame uniform buffers and descriptor sets (multiplexed across
//!   frames in flight)
//! - Frame-in-flight synchronization and the wait-before-reuse rule
//! - Depth buffer management
//! - The frame orchestrator running acquire -> update -> record ->
//!   submit -> present

pub mod arena;
pub mod depth_buffer;
pub mod flight;
pub mod frame;
pub mod frame_manager;
pub mod frame_resources;
pub mod renderer;
pub mod ubo;

pub use arena::MeshArena;
pub use frame::FrameContext;
pub use frame_manager::FrameManager;
pub use frame_resources::FrameUniforms;
pub use renderer::Renderer;
pub use ubo::{GlobalUbo, MAX_POINT_LIGHTS, PointLightUbo};

/// Maximum number of frames that can be processed concurrently.
///
/// Using 2 allows the CPU to prepare the next frame while the GPU renders
/// the current one.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
