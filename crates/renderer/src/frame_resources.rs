//! Per-frame uniform buffers and descriptor sets.
//!
//! With frames in flight, the GPU may be reading frame N's uniform data
//! while the CPU prepares frame N+1. Each frame slot therefore owns its
//! own uniform buffer and its own descriptor set pointing at that buffer.
//! All slots are allocated once at startup and never resized; only the
//! buffer *contents* change, once per frame, after the orchestrator has
//! waited out the slot's previous use.

use std::sync::Arc;

use ash::vk;
use bytemuck::bytes_of;
use tracing::info;

use lantern_rhi::buffer::{Buffer, BufferUsage};
use lantern_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, update_descriptor_sets,
};
use lantern_rhi::device::Device;
use lantern_rhi::image::Texture;
use lantern_rhi::{RhiError, RhiResult};

use crate::ubo::GlobalUbo;

/// Fixed-size rotation of per-frame uniform buffers and descriptor sets.
///
/// Slot `i` serves the frames where `frame_counter % frames_in_flight == i`.
pub struct FrameUniforms {
    /// Device the sets were allocated from.
    device: Arc<Device>,
    /// One persistently mapped uniform buffer per frame slot.
    buffers: Vec<Buffer>,
    /// One descriptor set per frame slot, bound once at startup.
    sets: Vec<vk::DescriptorSet>,
    /// Layout shared by all slots (binding 0: uniform buffer, binding 1:
    /// combined image sampler).
    layout: DescriptorSetLayout,
    /// Pool sized to exactly the slot count.
    _pool: DescriptorPool,
}

impl FrameUniforms {
    /// Allocates the uniform buffer and descriptor set for every frame
    /// slot.
    ///
    /// Descriptor-set allocation cost is paid here, once; the render loop
    /// never reallocates binding tables.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `frames_in_flight` - Number of slots (must be non-zero)
    ///
    /// # Errors
    ///
    /// Returns an error if buffer, pool, or set allocation fails.
    pub fn new(device: Arc<Device>, frames_in_flight: usize) -> RhiResult<Self> {
        if frames_in_flight == 0 {
            return Err(RhiError::InvalidArgument(
                "frames_in_flight must be non-zero".to_string(),
            ));
        }

        let layout = DescriptorSetLayout::new(
            device.clone(),
            &[
                DescriptorBindingBuilder::uniform_buffer(
                    0,
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                ),
                DescriptorBindingBuilder::combined_image_sampler(
                    1,
                    vk::ShaderStageFlags::FRAGMENT,
                ),
            ],
        )?;

        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(frames_in_flight as u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(frames_in_flight as u32),
        ];
        let pool = DescriptorPool::new(device.clone(), frames_in_flight as u32, &pool_sizes)?;

        let mut buffers = Vec::with_capacity(frames_in_flight);
        for _ in 0..frames_in_flight {
            buffers.push(Buffer::new(
                device.clone(),
                BufferUsage::Uniform,
                GlobalUbo::size() as vk::DeviceSize,
            )?);
        }

        let layouts = vec![layout.handle(); frames_in_flight];
        let sets = pool.allocate(&layouts)?;

        // Bind each slot's set to its buffer, once; contents change every
        // frame, the binding never does
        for (set, buffer) in sets.iter().zip(buffers.iter()) {
            let buffer_info = [buffer.descriptor_info()];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(*set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info);
            update_descriptor_sets(&device, &[write]);
        }

        info!(
            "Frame uniforms created: {} slot(s), {} bytes each",
            frames_in_flight,
            GlobalUbo::size()
        );

        Ok(Self {
            device,
            buffers,
            sets,
            layout,
            _pool: pool,
        })
    }

    /// Binds a texture to binding 1 of every frame slot.
    ///
    /// Call at load time, before the first frame that samples it; the
    /// binding tables must not be rewritten while a frame referencing
    /// them is in flight.
    pub fn set_texture(&self, texture: &Texture) {
        for set in &self.sets {
            let image_info = [texture.descriptor_info()];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(*set)
                .dst_binding(1)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&image_info);
            update_descriptor_sets(&self.device, &[write]);
        }
    }

    /// Writes this frame's uniform data into the given slot.
    ///
    /// The caller (the frame orchestrator) must have waited out the slot's
    /// previous GPU use before calling this; writes go straight through
    /// the persistent mapping and are flushed for visibility.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] for an out-of-range slot, or
    /// an error if the write/flush fails.
    pub fn write(&self, frame_index: usize, ubo: &GlobalUbo) -> RhiResult<()> {
        let buffer = self.buffers.get(frame_index).ok_or_else(|| {
            RhiError::InvalidArgument(format!(
                "frame index {} out of range for {} slots",
                frame_index,
                self.buffers.len()
            ))
        })?;

        buffer.write_data(0, bytes_of(ubo))?;
        buffer.flush()?;

        Ok(())
    }

    /// Returns the descriptor set for a frame slot.
    ///
    /// # Panics
    ///
    /// Panics if `frame_index` is out of range.
    #[inline]
    pub fn descriptor_set(&self, frame_index: usize) -> vk::DescriptorSet {
        self.sets[frame_index]
    }

    /// Returns the shared descriptor set layout (for pipeline layouts).
    #[inline]
    pub fn layout(&self) -> &DescriptorSetLayout {
        &self.layout
    }

    /// Number of frame slots.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.buffers.len()
    }
}
