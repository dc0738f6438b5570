//! Descriptor set management for shader resource binding.
//!
//! This module provides abstractions for Vulkan descriptor management:
//! - [`DescriptorSetLayout`] defines the layout of shader bindings
//! - [`DescriptorPool`] manages allocation of descriptor sets
//! - Helper functions for building bindings and updating sets
//!
//! Binding tables are allocated once at startup (one per frame in flight)
//! and never reallocated per frame; only the resources they point at are
//! written through [`update_descriptor_sets`].

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper.
///
/// A descriptor set layout defines the structure of resources that can be
/// bound to a shader: binding points, descriptor types, and the shader
/// stages that can access each resource.
///
/// # Thread Safety
///
/// The layout is immutable after creation and can be shared between threads
/// when wrapped in `Arc`.
pub struct DescriptorSetLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor set layout handle.
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bindings` - Array of binding descriptions
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool for allocating descriptor sets.
///
/// The pool must be created with enough capacity for all descriptor types
/// and sets that will be allocated from it. The frame multiplexer sizes its
/// pool to exactly the frame-in-flight count at startup and never grows it.
pub struct DescriptorPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor pool handle.
    pool: vk::DescriptorPool,
    /// Maximum number of sets that can be allocated.
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a new descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `max_sets` - Maximum number of descriptor sets that can be allocated
    /// * `pool_sizes` - Array of pool sizes for each descriptor type
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// Allocates descriptor sets from the pool.
    ///
    /// # Arguments
    ///
    /// * `layouts` - Array of descriptor set layouts for each set to allocate
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails (e.g., pool exhausted).
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    /// Returns the Vulkan descriptor pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Returns the maximum number of sets that can be allocated from this
    /// pool.
    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Updates descriptor sets with resource bindings.
///
/// This function writes resource bindings to one or more descriptor sets.
/// It's the primary way to connect buffers and images to shaders.
///
/// # Arguments
///
/// * `device` - The logical device
/// * `writes` - Array of write descriptor set operations
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }

    debug!("Updated {} descriptor set(s)", writes.len());
}

/// Builder for descriptor set layout bindings.
pub struct DescriptorBindingBuilder;

impl DescriptorBindingBuilder {
    /// Creates a uniform buffer binding.
    ///
    /// # Arguments
    ///
    /// * `binding` - The binding index
    /// * `stage_flags` - The shader stages that can access this binding
    #[inline]
    pub fn uniform_buffer(
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stage_flags)
    }

    /// Creates a combined image sampler binding.
    ///
    /// # Arguments
    ///
    /// * `binding` - The binding index
    /// * `stage_flags` - The shader stages that can access this binding
    #[inline]
    pub fn combined_image_sampler(
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(stage_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffer_binding() {
        let binding = DescriptorBindingBuilder::uniform_buffer(
            0,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        );
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert!(binding.stage_flags.contains(vk::ShaderStageFlags::VERTEX));
        assert!(binding.stage_flags.contains(vk::ShaderStageFlags::FRAGMENT));
    }

    #[test]
    fn test_combined_image_sampler_binding() {
        let binding =
            DescriptorBindingBuilder::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(binding.binding, 1);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }
}
