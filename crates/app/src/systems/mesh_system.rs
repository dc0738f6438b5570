//! Opaque mesh rendering.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use lantern_renderer::{FrameContext, MeshArena, Renderer};
use lantern_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use lantern_rhi::shader::ShaderModule;
use lantern_rhi::vertex::Vertex;
use lantern_rhi::{RhiResult, vk};
use lantern_scene::World;

/// Push constant block for the mesh shaders.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MeshPushConstants {
    model: Mat4,
    normal: Mat4,
}

/// Draws every mesh-bearing scene object with the shared global binding
/// table and per-object push constants.
pub struct MeshRenderSystem {
    pipeline: Pipeline,
    layout: PipelineLayout,
}

impl MeshRenderSystem {
    /// Builds the mesh pipeline against the renderer's attachment formats.
    ///
    /// # Arguments
    /// * `renderer` - The renderer (provides device, formats, set layout)
    /// * `shader_dir` - Directory holding `mesh.vert.spv` / `mesh.frag.spv`
    ///
    /// # Errors
    /// Returns an error if the shaders cannot be loaded or pipeline
    /// creation fails.
    pub fn new(renderer: &Renderer, shader_dir: &Path) -> RhiResult<Self> {
        let device = renderer.device().clone();

        let vertex_shader =
            ShaderModule::from_file(device.clone(), &shader_dir.join("mesh.vert.spv"))?;
        let fragment_shader =
            ShaderModule::from_file(device.clone(), &shader_dir.join("mesh.frag.spv"))?;

        let push_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<MeshPushConstants>() as u32);

        let layout = PipelineLayout::new(
            device.clone(),
            &[renderer.global_set_layout().handle()],
            &[push_range],
        )?;

        let pipeline = GraphicsPipelineBuilder::new(&vertex_shader, &fragment_shader)
            .color_format(renderer.color_format())
            .depth_format(renderer.depth_format())
            .vertex_input(
                Vertex::binding_description(),
                &Vertex::attribute_descriptions(),
            )
            .cull_mode(vk::CullModeFlags::NONE)
            .build(device, &layout)?;

        Ok(Self { pipeline, layout })
    }

    /// Records draw calls for all mesh objects in the world.
    pub fn render(&self, context: &FrameContext, world: &World, arena: &MeshArena) {
        let cmd = context.command_buffer;

        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.layout.handle(),
            0,
            &[context.global_descriptor_set],
            &[],
        );

        for object in world.objects() {
            let Some(handle) = object.mesh_handle() else {
                continue;
            };
            let Some(mesh) = arena.get(handle) else {
                continue;
            };

            let push = MeshPushConstants {
                model: object.transform.matrix(),
                normal: object.transform.normal_matrix(),
            };
            cmd.push_constants(
                self.layout.handle(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                &push,
            );

            mesh.bind(cmd);
            mesh.draw(cmd);
        }
    }
}
