//! Graphics pipeline creation.
//!
//! This module provides a builder for graphics pipelines targeting dynamic
//! rendering (Vulkan 1.3): pipelines are created against attachment formats
//! instead of a VkRenderPass. Viewport and scissor are always dynamic
//! state, so pipelines survive window resizes.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::ShaderModule;

/// Pipeline layout wrapper.
///
/// Describes the descriptor set layouts and push constant ranges a
/// pipeline's shaders can access.
pub struct PipelineLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline layout handle.
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a new pipeline layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `set_layouts` - Descriptor set layouts, in set-index order
    /// * `push_constant_ranges` - Push constant ranges used by the shaders
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!(
            "Created pipeline layout: {} set layout(s), {} push constant range(s)",
            set_layouts.len(),
            push_constant_ranges.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan pipeline layout handle.
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Destroyed pipeline layout");
    }
}

/// Graphics pipeline wrapper.
pub struct Pipeline {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline handle.
    pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        debug!("Destroyed graphics pipeline");
    }
}

/// Builder for graphics pipelines.
///
/// Collects plain configuration values and assembles the Vulkan create
/// info structures in [`build`](Self::build).
pub struct GraphicsPipelineBuilder<'a> {
    vertex_shader: &'a ShaderModule,
    fragment_shader: &'a ShaderModule,
    color_format: vk::Format,
    depth_format: Option<vk::Format>,
    vertex_binding: Option<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    alpha_blending: bool,
    depth_test: bool,
    depth_write: bool,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    /// Creates a builder with the vertex and fragment shader stages.
    ///
    /// Defaults: no vertex input, back-face culling, counter-clockwise
    /// front faces, opaque blending, depth test and write enabled.
    pub fn new(vertex_shader: &'a ShaderModule, fragment_shader: &'a ShaderModule) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            color_format: vk::Format::B8G8R8A8_SRGB,
            depth_format: None,
            vertex_binding: None,
            vertex_attributes: Vec::new(),
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            alpha_blending: false,
            depth_test: true,
            depth_write: true,
        }
    }

    /// Sets the color attachment format for dynamic rendering.
    pub fn color_format(mut self, format: vk::Format) -> Self {
        self.color_format = format;
        self
    }

    /// Sets the depth attachment format for dynamic rendering.
    pub fn depth_format(mut self, format: vk::Format) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Sets the vertex input binding and attribute descriptions.
    ///
    /// Without this, the pipeline consumes no vertex input (vertices are
    /// generated in the shader, e.g. for billboards).
    pub fn vertex_input(
        mut self,
        binding: vk::VertexInputBindingDescription,
        attributes: &[vk::VertexInputAttributeDescription],
    ) -> Self {
        self.vertex_binding = Some(binding);
        self.vertex_attributes = attributes.to_vec();
        self
    }

    /// Sets the cull mode.
    pub fn cull_mode(mut self, cull_mode: vk::CullModeFlags) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Sets the front face winding.
    pub fn front_face(mut self, front_face: vk::FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    /// Enables standard alpha blending on the color attachment.
    ///
    /// Used by the translucent passes (light billboards), which must be
    /// recorded after the opaque geometry they blend against.
    pub fn alpha_blending(mut self, enabled: bool) -> Self {
        self.alpha_blending = enabled;
        self
    }

    /// Configures depth testing and depth writes.
    pub fn depth(mut self, test: bool, write: bool) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }

    /// Builds the graphics pipeline.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `layout` - The pipeline layout the shaders were written against
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline creation fails.
    pub fn build(self, device: Arc<Device>, layout: &PipelineLayout) -> RhiResult<Pipeline> {
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(self.vertex_shader.handle())
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(self.fragment_shader.handle())
                .name(c"main"),
        ];

        let bindings: Vec<vk::VertexInputBindingDescription> =
            self.vertex_binding.into_iter().collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(self.cull_mode)
            .front_face(self.front_face)
            .depth_bias_enable(false);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(self.depth_test)
            .depth_write_enable(self.depth_write)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachment = if self.alpha_blending {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD)
        } else {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)
        };
        let blend_attachments = [blend_attachment];

        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // Dynamic rendering: attachment formats instead of a render pass
        let color_formats = [self.color_format];
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(self.depth_format.unwrap_or(vk::Format::UNDEFINED));

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout.handle())
            .push_next(&mut rendering_info);

        let pipelines = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, err)| RhiError::Vulkan(err))?
        };

        info!("Created graphics pipeline");

        Ok(Pipeline {
            device,
            pipeline: pipelines[0],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Pipeline>();
        assert_send::<PipelineLayout>();
    }
}
