//! Staged uploads to device-local memory.
//!
//! This module implements the load-time transfer path: CPU-resident bytes
//! are copied into a host-visible staging buffer, then a one-shot command
//! submission copies them into the device-local destination. The submission
//! is fenced and the call blocks until the GPU signals completion, so the
//! destination resource is fully initialized when the function returns.
//!
//! Correctness over throughput is the deliberate tradeoff here: uploads
//! only happen at load time, and a blocking single submission keeps the
//! ownership story trivial (the staging buffer is dropped on return, the
//! destination is immutable afterwards).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lantern_rhi::buffer::BufferUsage;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::staging::Uploader;
//!
//! # fn example(device: Arc<Device>) -> Result<(), lantern_rhi::RhiError> {
//! let uploader = Uploader::new(device)?;
//!
//! let vertices: [f32; 9] = [0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0];
//! let vertex_buffer = uploader.upload_buffer(
//!     BufferUsage::Vertex,
//!     bytemuck::cast_slice(&vertices),
//! )?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::{CommandBuffer, CommandPool};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::sync::Fence;

/// One-shot upload engine for device-local resources.
///
/// Owns a transient command pool on the graphics queue family. Each upload
/// records a single-use command buffer, submits it with a fresh fence, and
/// blocks until the transfer has landed.
pub struct Uploader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Transient pool the one-shot command buffers come from.
    pool: CommandPool,
}

impl Uploader {
    /// Creates a new uploader with its own transient command pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    ///
    /// # Errors
    ///
    /// Returns an error if the command pool cannot be created.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let graphics_family = device.queue_families().graphics_family.ok_or_else(|| {
            RhiError::InvalidArgument("device has no graphics queue family".to_string())
        })?;

        let pool = CommandPool::new_transient(device.clone(), graphics_family)?;

        Ok(Self { device, pool })
    }

    /// Uploads bytes into a new device-local buffer.
    ///
    /// The returned buffer is fully initialized and immutable from the
    /// caller's point of view. On any failure no destination resource
    /// survives.
    ///
    /// # Arguments
    ///
    /// * `usage` - Destination usage; must be a device-local kind
    ///   ([`BufferUsage::Vertex`] or [`BufferUsage::Index`])
    /// * `data` - Source bytes; must be non-empty
    ///
    /// # Errors
    ///
    /// - [`RhiError::InvalidArgument`] for empty input or a host-visible
    ///   destination kind
    /// - [`RhiError::ResourceExhausted`] if device memory for the
    ///   destination cannot be allocated
    /// - Other errors if command recording or submission fails
    pub fn upload_buffer(&self, usage: BufferUsage, data: &[u8]) -> RhiResult<Buffer> {
        if data.is_empty() {
            return Err(RhiError::InvalidArgument(
                "cannot upload an empty byte span".to_string(),
            ));
        }
        if usage.memory_location() != gpu_allocator::MemoryLocation::GpuOnly {
            return Err(RhiError::InvalidArgument(format!(
                "{} buffers are host-visible; write them directly instead of staging",
                usage.name()
            )));
        }

        let size = data.len() as vk::DeviceSize;

        // Staging buffer is persistently mapped; dropped when this
        // function returns
        let staging = Buffer::new_with_data(self.device.clone(), BufferUsage::Staging, data)?;

        let destination = Buffer::new(self.device.clone(), usage, size)?;

        let region = vk::BufferCopy::default().size(size);
        self.one_shot(|cmd| {
            cmd.copy_buffer(staging.handle(), destination.handle(), &[region]);
        })?;

        debug!("Uploaded {} bytes into {} buffer", size, usage.name());

        Ok(destination)
    }

    /// Records commands into a single-use command buffer, submits it, and
    /// blocks until the GPU signals completion.
    ///
    /// Used by the buffer upload path above and by the image manager for
    /// layout transitions and pixel copies.
    ///
    /// # Arguments
    ///
    /// * `record` - Closure that records transfer commands
    ///
    /// # Errors
    ///
    /// Returns an error if allocation, recording, submission, or the fence
    /// wait fails.
    pub fn one_shot<F>(&self, record: F) -> RhiResult<()>
    where
        F: FnOnce(&CommandBuffer),
    {
        let cmd = CommandBuffer::new(self.device.clone(), &self.pool)?;

        let result = self.submit_recorded(&cmd, record);

        // The command buffer is returned to the transient pool whether or
        // not the submission succeeded
        unsafe {
            self.pool.free_command_buffers(&[cmd.handle()]);
        }

        result
    }

    fn submit_recorded<F>(&self, cmd: &CommandBuffer, record: F) -> RhiResult<()>
    where
        F: FnOnce(&CommandBuffer),
    {
        cmd.begin()?;
        record(cmd);
        cmd.end()?;

        let fence = Fence::new(self.device.clone(), false)?;

        let command_buffers = [cmd.handle()];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe {
            self.device.submit_graphics(&[submit_info], fence.handle())?;
        }

        fence.wait(u64::MAX)?;

        Ok(())
    }

    /// Returns a reference to the device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploader_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Uploader>();
    }
}
