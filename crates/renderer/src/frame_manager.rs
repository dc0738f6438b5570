//! Frame management and synchronization.
//!
//! This module provides the [`FrameManager`] struct for managing per-frame
//! resources and coordinating the rendering loop. It handles:
//!
//! - Per-frame command buffers
//! - Synchronization primitives (semaphores and fences)
//! - Swapchain image acquisition and presentation
//! - Frame-in-flight management
//!
//! # Overview
//!
//! The frame manager implements a "frames in flight" pattern where
//! multiple frames can be processed concurrently:
//!
//! 1. While the GPU renders frame N, the CPU prepares frame N+1
//! 2. Each frame slot has its own set of resources to avoid contention
//! 3. Fences ensure the CPU doesn't overwrite resources still in use:
//!    before a slot is reused, its fence is waited on - but only when the
//!    slot actually has an outstanding submission (see
//!    [`crate::flight::FlightTracker`])
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Wait on in_flight_fence if this slot was previously submitted
//! 2. Acquire swapchain image (signals image_available_semaphore)
//! 3. Record commands to command_buffer
//! 4. Submit command_buffer:
//!    - Wait on image_available_semaphore
//!    - Signal render_finished_semaphore
//!    - Signal in_flight_fence
//! 5. Present (waits on render_finished_semaphore)
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use lantern_rhi::RhiResult;
use lantern_rhi::command::{CommandBuffer, CommandPool};
use lantern_rhi::device::Device;
use lantern_rhi::swapchain::Swapchain;
use lantern_rhi::sync::{Fence, Semaphore};

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::flight::FlightTracker;

/// Per-frame rendering data.
///
/// Each frame in flight has its own set of resources to avoid
/// synchronization issues between frames.
pub struct FrameData {
    /// Command buffer for recording rendering commands.
    command_buffer: CommandBuffer,
    /// Semaphore signaled when a swapchain image is available.
    image_available_semaphore: Semaphore,
    /// Semaphore signaled when rendering is complete.
    render_finished_semaphore: Semaphore,
    /// Fence signaled when this slot's submission finishes executing.
    in_flight_fence: Fence,
}

impl FrameData {
    /// Creates a new set of per-frame resources.
    ///
    /// The fence starts unsignaled; the flight tracker guarantees it is
    /// only waited on after a submission has actually signaled it.
    fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), command_pool)?;
        let image_available_semaphore = Semaphore::new(device.clone())?;
        let render_finished_semaphore = Semaphore::new(device.clone())?;
        let in_flight_fence = Fence::new(device, false)?;

        Ok(Self {
            command_buffer,
            image_available_semaphore,
            render_finished_semaphore,
            in_flight_fence,
        })
    }

    /// Returns a reference to the command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Returns a reference to the image available semaphore.
    #[inline]
    pub fn image_available_semaphore(&self) -> &Semaphore {
        &self.image_available_semaphore
    }

    /// Returns a reference to the render finished semaphore.
    #[inline]
    pub fn render_finished_semaphore(&self) -> &Semaphore {
        &self.render_finished_semaphore
    }

    /// Returns a reference to the in-flight fence.
    #[inline]
    pub fn in_flight_fence(&self) -> &Fence {
        &self.in_flight_fence
    }
}

/// Manages per-frame resources and the frame rendering loop.
///
/// The manager maintains [`MAX_FRAMES_IN_FLIGHT`] sets of resources and is
/// the only place that knows the global frame counter; the current slot is
/// always `frame_counter % MAX_FRAMES_IN_FLIGHT`.
///
/// # Thread Safety
///
/// Not thread-safe; drive it from the render thread only.
pub struct FrameManager {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Per-frame resources.
    frames: Vec<FrameData>,
    /// Which slots have outstanding submissions.
    tracker: FlightTracker,
    /// Monotonic frame counter.
    frame_counter: u64,
    /// Current swapchain image index.
    image_index: u32,
}

impl FrameManager {
    /// Creates a new frame manager.
    ///
    /// This allocates [`MAX_FRAMES_IN_FLIGHT`] sets of per-frame resources.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `command_pool` - The command pool to allocate command buffers from
    ///
    /// # Errors
    ///
    /// Returns an error if any resource creation fails.
    pub fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        for i in 0..MAX_FRAMES_IN_FLIGHT {
            let frame_data = FrameData::new(device.clone(), command_pool)?;
            debug!("Created frame data for slot {}", i);
            frames.push(frame_data);
        }

        info!(
            "Frame manager created with {} frames in flight",
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            device,
            frames,
            tracker: FlightTracker::new(MAX_FRAMES_IN_FLIGHT),
            frame_counter: 0,
            image_index: 0,
        })
    }

    /// Returns a reference to the current frame's data.
    #[inline]
    pub fn current_frame(&self) -> &FrameData {
        &self.frames[self.current_frame_index()]
    }

    /// Returns the current frame slot index
    /// (`frame_counter % MAX_FRAMES_IN_FLIGHT`).
    #[inline]
    pub fn current_frame_index(&self) -> usize {
        (self.frame_counter % self.frames.len() as u64) as usize
    }

    /// Returns the monotonic frame counter.
    #[inline]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Returns the current swapchain image index.
    ///
    /// Set by [`acquire_next_image`](Self::acquire_next_image).
    #[inline]
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Waits until the current slot's previous GPU use is complete.
    ///
    /// Blocks on the slot's fence only when the slot actually has an
    /// outstanding submission, then resets the fence for the next one.
    /// Must be called before touching the slot's command buffer or uniform
    /// data.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait or reset fails.
    pub fn wait_for_slot(&mut self) -> RhiResult<()> {
        let slot = self.current_frame_index();
        let frame = &self.frames[slot];

        self.tracker.acquire_slot(slot, || {
            frame.in_flight_fence.wait(u64::MAX)?;
            frame.in_flight_fence.reset()
        })
    }

    /// Acquires the next swapchain image for rendering.
    ///
    /// Signals the current frame's image available semaphore when the
    /// image is ready.
    ///
    /// # Returns
    ///
    /// Returns `true` if the swapchain is out of date or suboptimal and
    /// must be recreated before this frame can continue.
    ///
    /// # Errors
    ///
    /// Returns an error if acquisition fails for a reason other than an
    /// out-of-date surface.
    pub fn acquire_next_image(&mut self, swapchain: &Swapchain) -> RhiResult<bool> {
        let frame = self.current_frame();

        match swapchain.acquire_next_image(frame.image_available_semaphore.handle()) {
            Ok((index, suboptimal)) => {
                self.image_index = index;
                Ok(suboptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Begins recording commands for the current frame.
    ///
    /// Must be called after [`wait_for_slot`](Self::wait_for_slot).
    ///
    /// # Errors
    ///
    /// Returns an error if resetting or beginning the command buffer fails.
    pub fn begin_frame(&self) -> RhiResult<()> {
        let frame = self.current_frame();
        frame.command_buffer.reset()?;
        frame.command_buffer.begin()?;
        Ok(())
    }

    /// Ends recording commands for the current frame.
    ///
    /// # Errors
    ///
    /// Returns an error if ending the command buffer fails.
    pub fn end_frame(&self) -> RhiResult<()> {
        self.current_frame().command_buffer.end()?;
        Ok(())
    }

    /// Submits the current frame's commands to the graphics queue.
    ///
    /// The submission waits on the image available semaphore, signals the
    /// render finished semaphore, and signals the slot's fence. The slot
    /// is marked in flight so its next reuse waits.
    ///
    /// # Errors
    ///
    /// Returns an error if queue submission fails.
    pub fn submit(&mut self) -> RhiResult<()> {
        let slot = self.current_frame_index();
        let frame = &self.frames[slot];

        let wait_semaphores = [frame.image_available_semaphore.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_finished_semaphore.handle()];
        let command_buffers = [frame.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.in_flight_fence.handle())?;
        }

        self.tracker.mark_submitted(slot);

        Ok(())
    }

    /// Presents the rendered image to the screen.
    ///
    /// # Returns
    ///
    /// Returns `true` if the swapchain is out of date or suboptimal and
    /// should be recreated.
    ///
    /// # Errors
    ///
    /// Returns an error if presentation fails for a reason other than an
    /// out-of-date surface.
    pub fn present(&self, swapchain: &Swapchain) -> RhiResult<bool> {
        let frame = self.current_frame();

        match swapchain.present(
            self.device.present_queue(),
            self.image_index,
            frame.render_finished_semaphore.handle(),
        ) {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(true)
            }
            Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain suboptimal during present");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Advances the frame counter to the next frame.
    pub fn next_frame(&mut self) {
        self.frame_counter += 1;
    }

    /// Drains every in-flight frame and marks all slots idle.
    ///
    /// Used before swapchain recreation and tear-down so no submitted
    /// command buffer still references resources about to be destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if a fence wait fails.
    pub fn wait_for_all_frames(&mut self) -> RhiResult<()> {
        for (slot, frame) in self.frames.iter().enumerate() {
            if self.tracker.is_in_flight(slot) {
                frame.in_flight_fence.wait(u64::MAX)?;
                frame.in_flight_fence.reset()?;
            }
        }
        self.tracker.clear();

        Ok(())
    }

    /// Recreates all semaphores after swapchain recreation so none is left
    /// with a stale pending signal.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn reset_semaphores(&mut self) -> RhiResult<()> {
        for (i, frame) in self.frames.iter_mut().enumerate() {
            frame.image_available_semaphore = Semaphore::new(self.device.clone())?;
            frame.render_finished_semaphore = Semaphore::new(self.device.clone())?;
            debug!("Reset semaphores for slot {}", i);
        }

        Ok(())
    }

    /// Returns the number of frames in flight.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_frames_in_flight_constant() {
        assert!(MAX_FRAMES_IN_FLIGHT >= 1);
        assert!(MAX_FRAMES_IN_FLIGHT <= 4);
    }

    #[test]
    fn test_frame_manager_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameManager>();
    }

    #[test]
    fn test_frame_data_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameData>();
    }
}
