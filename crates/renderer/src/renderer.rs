//! Frame orchestration.
//!
//! The [`Renderer`] owns the Vulkan context and drives the fixed per-frame
//! cycle: acquire -> update -> record -> submit -> present. It is the only
//! component that knows the global frame counter and the frame-in-flight
//! count; render systems receive the current slot through a
//! [`FrameContext`] and never touch the rotation themselves.
//!
//! A stale surface (out-of-date report from acquire or present) is not an
//! error: the orchestrator rebuilds the swapchain, skips the frame, and
//! carries on. On drop, the GPU is drained before any owned resource is
//! destroyed.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use lantern_platform::{Surface, Window};
use lantern_rhi::command::CommandPool;
use lantern_rhi::descriptor::DescriptorSetLayout;
use lantern_rhi::device::Device;
use lantern_rhi::instance::Instance;
use lantern_rhi::physical_device::select_physical_device;
use lantern_rhi::staging::Uploader;
use lantern_rhi::swapchain::Swapchain;
use lantern_rhi::{RhiError, RhiResult};

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::depth_buffer::{DEPTH_FORMAT, DepthBuffer};
use crate::frame::FrameContext;
use crate::frame_manager::FrameManager;
use crate::frame_resources::FrameUniforms;
use crate::ubo::GlobalUbo;

/// Owns the Vulkan context and drives the frame loop.
///
/// Fields are declared in destruction order: per-frame resources first,
/// swapchain before the surface, the instance last.
pub struct Renderer {
    /// Per-frame uniform buffers and descriptor sets.
    frame_uniforms: FrameUniforms,
    /// Per-frame command buffers and synchronization.
    frames: FrameManager,
    /// Command pool the per-frame command buffers come from.
    command_pool: CommandPool,
    /// Staged upload engine for load-time resource creation.
    uploader: Uploader,
    /// Depth attachment, recreated with the swapchain.
    depth_buffer: DepthBuffer,
    /// The swapchain.
    swapchain: Swapchain,
    /// The window surface (outlives the swapchain).
    surface: Surface,
    /// The logical device.
    device: Arc<Device>,
    /// The Vulkan instance (destroyed last).
    instance: Instance,

    /// Current drawable width.
    width: u32,
    /// Current drawable height.
    height: u32,
    /// Set when the window reported a resize; handled at the next frame.
    framebuffer_resized: bool,
}

impl Renderer {
    /// Creates the full Vulkan context for a window.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the context (instance, surface,
    /// device, swapchain, per-frame resources) fails to initialize.
    /// Startup should be aborted in that case.
    pub fn new(window: &Window) -> RhiResult<Self> {
        let instance = Instance::new(cfg!(debug_assertions))?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let width = window.width();
        let height = window.height();

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            width,
            height,
        )?;

        let depth_buffer = DepthBuffer::new(device.clone(), swapchain.extent())?;

        let graphics_family = device.queue_families().graphics_family.unwrap();
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let uploader = Uploader::new(device.clone())?;

        let frames = FrameManager::new(device.clone(), &command_pool)?;
        let frame_uniforms = FrameUniforms::new(device.clone(), MAX_FRAMES_IN_FLIGHT)?;

        info!("Renderer initialized");

        Ok(Self {
            frame_uniforms,
            frames,
            command_pool,
            uploader,
            depth_buffer,
            swapchain,
            surface,
            device,
            instance,
            width,
            height,
            framebuffer_resized: false,
        })
    }

    /// Returns the logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the staged upload engine.
    #[inline]
    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    /// Returns the graphics command pool.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// Returns the per-frame uniform multiplexer.
    #[inline]
    pub fn frame_uniforms(&self) -> &FrameUniforms {
        &self.frame_uniforms
    }

    /// Returns the descriptor set layout shared by all frame slots.
    ///
    /// Render systems build their pipeline layouts against this.
    #[inline]
    pub fn global_set_layout(&self) -> &DescriptorSetLayout {
        self.frame_uniforms.layout()
    }

    /// Returns the swapchain color format.
    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Returns the depth attachment format.
    #[inline]
    pub fn depth_format(&self) -> vk::Format {
        DEPTH_FORMAT
    }

    /// Returns the current render area extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the current aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        let extent = self.swapchain.extent();
        extent.width as f32 / extent.height.max(1) as f32
    }

    /// Notes a new drawable size; the swapchain is rebuilt on the next
    /// frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.framebuffer_resized = true;
    }

    /// Blocks until the GPU is idle.
    ///
    /// Call before destroying resources the GPU may still reference (e.g.
    /// the mesh arena at shutdown).
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    /// Runs one frame of the fixed cycle.
    ///
    /// 1. Wait until the current slot's previous GPU use is complete
    /// 2. Acquire the next swapchain image (a stale surface rebuilds the
    ///    swapchain and skips the frame)
    /// 3. `update` computes this frame's [`GlobalUbo`], which is written
    ///    into the slot's uniform buffer
    /// 4. `record` records draw commands inside the rendering scope; the
    ///    caller invokes its render systems in a fixed order (opaque
    ///    geometry before translucent billboards)
    /// 5. Submit and present, then advance the frame counter
    ///
    /// # Arguments
    ///
    /// * `frame_time` - Seconds since the previous frame
    /// * `update` - Produces the frame's uniform data; receives the slot
    ///   index
    /// * `record` - Records draw commands for the frame
    ///
    /// # Errors
    ///
    /// Returns an error on unrecoverable device failures. A stale surface
    /// is handled internally and not surfaced.
    pub fn run_frame<U, R>(&mut self, frame_time: f32, update: U, record: R) -> RhiResult<()>
    where
        U: FnOnce(usize) -> GlobalUbo,
        R: FnOnce(&FrameContext),
    {
        let frame_index = self.frames.current_frame_index();

        // The slot's fence guards its command buffer and uniform buffer;
        // nothing below may touch either before this wait
        self.frames.wait_for_slot()?;

        if self.framebuffer_resized {
            self.framebuffer_resized = false;
            self.recreate_swapchain()?;
            return Ok(());
        }

        if self.frames.acquire_next_image(&self.swapchain)? {
            debug!("Skipping frame: surface out of date at acquire");
            self.recreate_swapchain()?;
            return Ok(());
        }

        let ubo = update(frame_index);
        self.frame_uniforms.write(frame_index, &ubo)?;

        self.frames.begin_frame()?;
        self.record_frame(frame_index, frame_time, record);
        self.frames.end_frame()?;

        self.frames.submit()?;

        if self.frames.present(&self.swapchain)? {
            debug!("Surface out of date at present, rebuilding swapchain");
            self.recreate_swapchain()?;
        }

        self.frames.next_frame();

        Ok(())
    }

    /// Records the frame: attachment transitions, the rendering scope,
    /// and the caller's draw commands.
    fn record_frame<R>(&self, frame_index: usize, frame_time: f32, record: R)
    where
        R: FnOnce(&FrameContext),
    {
        let cmd = self.frames.current_frame().command_buffer();
        let image_index = self.frames.image_index();
        let extent = self.swapchain.extent();

        // Swapchain image: undefined -> color attachment
        let to_color = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.swapchain.image(image_index))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

        // Depth image: contents are cleared each frame, so the previous
        // layout doesn't matter
        let to_depth = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.depth_buffer.image())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            &[to_color, to_depth],
        );

        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(self.swapchain.image_view(image_index))
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.01, 0.01, 0.01, 1.0],
                },
            });
        let color_attachments = [color_attachment];

        let depth_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(self.depth_buffer.view())
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .clear_value(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            });

        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            })
            .layer_count(1)
            .color_attachments(&color_attachments)
            .depth_attachment(&depth_attachment);

        cmd.begin_rendering(&rendering_info);

        // Negative-height viewport flips Y so world +Y is up in clip space
        cmd.set_viewport(&vk::Viewport {
            x: 0.0,
            y: extent.height as f32,
            width: extent.width as f32,
            height: -(extent.height as f32),
            min_depth: 0.0,
            max_depth: 1.0,
        });
        cmd.set_scissor(&vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        });

        let context = FrameContext {
            frame_index,
            command_buffer: cmd,
            global_descriptor_set: self.frame_uniforms.descriptor_set(frame_index),
            extent,
            frame_time,
        };
        record(&context);

        cmd.end_rendering();

        // Swapchain image: color attachment -> present
        let to_present = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.swapchain.image(image_index))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_access_mask(vk::AccessFlags::empty());

        cmd.pipeline_barrier(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            &[to_present],
        );
    }

    /// Rebuilds the swapchain and its dependents for the current drawable
    /// size. Skipped while the window is minimized (zero extent).
    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        if self.width == 0 || self.height == 0 {
            debug!("Skipping swapchain rebuild for zero-sized drawable");
            return Ok(());
        }

        self.frames.wait_for_all_frames()?;

        self.swapchain
            .recreate(&self.instance, self.surface.handle(), self.width, self.height)?;

        let new_depth = DepthBuffer::new(self.device.clone(), self.swapchain.extent())?;
        let _old = std::mem::replace(&mut self.depth_buffer, new_depth);

        // Acquire may have left a stale pending signal on a semaphore
        self.frames.reset_semaphores()?;

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Nothing owned here may be destroyed while a submitted frame is
        // still executing
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {:?}", e);
        }
        info!("Renderer shut down");
    }
}
