//! Point light billboards.
//!
//! Lights orbit the scene center and are drawn as camera-facing discs.
//! The billboards alpha-blend, so this system must run after the opaque
//! mesh pass.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};

use lantern_renderer::{FrameContext, GlobalUbo, Renderer};
use lantern_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use lantern_rhi::shader::ShaderModule;
use lantern_rhi::{RhiResult, vk};
use lantern_scene::{ObjectKind, World};

/// Push constant block for the billboard shaders.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PointLightPushConstants {
    position: Vec4,
    color: Vec4,
    radius: f32,
    _padding: [f32; 3],
}

/// Animates point lights and draws their billboards.
pub struct PointLightSystem {
    pipeline: Pipeline,
    layout: PipelineLayout,
}

impl PointLightSystem {
    /// Builds the billboard pipeline: no vertex input (vertices come from
    /// a constant table in the shader), alpha blending, depth test without
    /// depth writes.
    ///
    /// # Errors
    /// Returns an error if the shaders cannot be loaded or pipeline
    /// creation fails.
    pub fn new(renderer: &Renderer, shader_dir: &Path) -> RhiResult<Self> {
        let device = renderer.device().clone();

        let vertex_shader =
            ShaderModule::from_file(device.clone(), &shader_dir.join("point_light.vert.spv"))?;
        let fragment_shader =
            ShaderModule::from_file(device.clone(), &shader_dir.join("point_light.frag.spv"))?;

        let push_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<PointLightPushConstants>() as u32);

        let layout = PipelineLayout::new(
            device.clone(),
            &[renderer.global_set_layout().handle()],
            &[push_range],
        )?;

        let pipeline = GraphicsPipelineBuilder::new(&vertex_shader, &fragment_shader)
            .color_format(renderer.color_format())
            .depth_format(renderer.depth_format())
            .cull_mode(vk::CullModeFlags::NONE)
            .alpha_blending(true)
            .depth(true, false)
            .build(device, &layout)?;

        Ok(Self { pipeline, layout })
    }

    /// Rotates the lights around the scene center and fills the frame's
    /// uniform light table.
    ///
    /// Lights beyond the uniform block's fixed capacity are skipped.
    pub fn update(&self, world: &mut World, frame_time: f32, ubo: &mut GlobalUbo) {
        let orbit = Quat::from_axis_angle(Vec3::Y, 0.5 * frame_time);

        for object in world.objects_mut() {
            let ObjectKind::PointLight(light) = object.kind else {
                continue;
            };

            object.transform.translation = orbit * object.transform.translation;

            ubo.push_point_light(
                object.transform.translation.extend(1.0),
                light.color.extend(light.intensity),
            );
        }
    }

    /// Records one billboard draw per light object.
    pub fn render(&self, context: &FrameContext, world: &World) {
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
            let Some(light) = object.point_light() else {
                continue;
            };

            let push = PointLightPushConstants {
                position: object.transform.translation.extend(1.0),
                color: light.color.extend(light.intensity),
                radius: light.radius,
                _padding: [0.0; 3],
            };
            cmd.push_constants(
                self.layout.handle(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                &push,
            );

            // Two triangles forming the billboard quad
            cmd.draw(6, 1, 0, 0);
        }
    }
}
