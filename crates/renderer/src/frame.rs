//! Per-frame recording context handed to render systems.

use ash::vk;

use lantern_rhi::command::CommandBuffer;

/// Everything a render system needs to record one frame.
///
/// Built by the frame orchestrator and passed to the record callback;
/// render systems read the current frame's binding table from here instead
/// of reaching into the multiplexer themselves.
pub struct FrameContext<'a> {
    /// Frame-in-flight slot index for this frame.
    pub frame_index: usize,
    /// Command buffer currently recording, inside a rendering scope.
    pub command_buffer: &'a CommandBuffer,
    /// The frame slot's global descriptor set (uniform binding table).
    pub global_descriptor_set: vk::DescriptorSet,
    /// Render area extent.
    pub extent: vk::Extent2D,
    /// Seconds since the previous frame.
    pub frame_time: f32,
}
