//! GPU buffer management.
//!
//! This module handles vertex, index, uniform, and staging buffers. It uses
//! gpu-allocator for memory management and provides safe abstractions for
//! buffer creation and data transfer.
//!
//! # Overview
//!
//! - [`BufferUsage`] defines how a buffer will be used (vertex, index,
//!   uniform, staging) and determines its memory placement
//! - [`Buffer`] wraps VkBuffer with gpu-allocator managed memory
//!
//! Vertex and index buffers live in device-local memory and are filled
//! through the staged upload path ([`crate::staging::Uploader`]). Uniform
//! and staging buffers are host-visible and persistently mapped.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Buffer usage type.
///
/// Defines the intended use of the buffer, which affects Vulkan usage flags
/// and memory allocation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer - device-local, filled via staged upload
    Vertex,
    /// Index buffer - device-local, filled via staged upload
    Index,
    /// Uniform buffer - host-visible, rewritten every frame
    Uniform,
    /// Staging buffer - host-visible source for transfers
    Staging,
}

impl BufferUsage {
    /// Converts to Vulkan buffer usage flags.
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => {
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Index => {
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Staging => vk::BufferUsageFlags::TRANSFER_SRC,
        }
    }

    /// Returns the preferred memory location for this buffer type.
    pub fn memory_location(self) -> MemoryLocation {
        match self {
            // Geometry is read by the GPU every frame and written once;
            // it belongs in device-local memory
            BufferUsage::Vertex | BufferUsage::Index => MemoryLocation::GpuOnly,
            // Uniform buffers need CPU writes every frame
            BufferUsage::Uniform => MemoryLocation::CpuToGpu,
            // Staging buffers are CPU-writable transfer sources
            BufferUsage::Staging => MemoryLocation::CpuToGpu,
        }
    }

    /// Returns a human-readable name for the buffer type.
    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Vertex => "vertex",
            BufferUsage::Index => "index",
            BufferUsage::Uniform => "uniform",
            BufferUsage::Staging => "staging",
        }
    }
}

/// GPU buffer wrapper with managed memory.
///
/// This struct wraps a Vulkan buffer and its associated memory allocation.
/// Memory is managed by gpu-allocator, which handles suballocation and
/// memory type selection.
///
/// Creation is all-or-nothing: if the memory allocation or bind fails, the
/// buffer handle is destroyed before the error is returned and no partially
/// constructed resource survives.
///
/// # Thread Safety
///
/// The buffer itself is not thread-safe. Synchronize access externally when
/// sharing between threads.
pub struct Buffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan buffer handle.
    buffer: vk::Buffer,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Buffer size in bytes.
    size: vk::DeviceSize,
    /// Buffer usage type.
    usage: BufferUsage,
}

impl Buffer {
    /// Creates a new buffer with the specified size.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `usage` - The intended buffer usage
    /// * `size` - Buffer size in bytes (must be non-zero)
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] for a zero size,
    /// [`RhiError::ResourceExhausted`] if the device memory for the buffer
    /// cannot be allocated, and other errors if buffer creation fails.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidArgument(
                "buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation_result = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: usage.name(),
                requirements,
                location: usage.memory_location(),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
        };

        let allocation = match allocation_result {
            Ok(allocation) => allocation,
            Err(err) => {
                // Destroy the orphaned handle so the failed call leaves
                // nothing behind
                unsafe { device.handle().destroy_buffer(buffer, None) };
                return Err(match err {
                    gpu_allocator::AllocationError::OutOfMemory => RhiError::ResourceExhausted {
                        what: usage.name(),
                        size,
                    },
                    other => RhiError::Allocator(other),
                });
            }
        };

        if let Err(err) = unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        } {
            let mut allocator = device.allocator().lock().unwrap();
            let _ = allocator.free(allocation);
            drop(allocator);
            unsafe { device.handle().destroy_buffer(buffer, None) };
            return Err(err.into());
        }

        debug!("Created {} buffer: {} bytes", usage.name(), size);

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
        })
    }

    /// Creates a new host-visible buffer and initializes it with data.
    ///
    /// This is a convenience method used for staging and uniform buffers;
    /// the buffer's memory location must be CPU-visible.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation or the data write fails.
    pub fn new_with_data(device: Arc<Device>, usage: BufferUsage, data: &[u8]) -> RhiResult<Self> {
        let buffer = Self::new(device, usage, data.len() as vk::DeviceSize)?;
        buffer.write_data(0, data)?;
        Ok(buffer)
    }

    /// Writes data to the buffer at the specified offset.
    ///
    /// The buffer must use CPU-visible memory (`CpuToGpu`).
    ///
    /// # Arguments
    ///
    /// * `offset` - Byte offset into the buffer
    /// * `data` - Data to write
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer memory is not mapped (device-local buffers)
    /// - The write would exceed the buffer size
    pub fn write_data(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidArgument(format!(
                "write exceeds buffer size: offset {} + data {} > buffer {}",
                offset,
                data.len(),
                self.size
            )));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidArgument("buffer allocation is not available".to_string())
        })?;

        let mapped_ptr = allocation.mapped_ptr().ok_or_else(|| {
            RhiError::InvalidArgument(format!(
                "{} buffer memory is not host-visible",
                self.usage.name()
            ))
        })?;

        unsafe {
            let dst = mapped_ptr.as_ptr().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst as *mut u8, data.len());
        }

        Ok(())
    }

    /// Flushes the buffer's mapped memory range to make host writes visible
    /// to the device.
    ///
    /// gpu-allocator places `CpuToGpu` buffers in host-coherent memory when
    /// available, in which case this is a no-op at the hardware level; the
    /// flush keeps writes correct when only non-coherent memory exists. The
    /// flushed offset is aligned down to `nonCoherentAtomSize` as required
    /// by the Vulkan spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is not mapped or the flush fails.
    pub fn flush(&self) -> RhiResult<()> {
        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidArgument("buffer allocation is not available".to_string())
        })?;

        if allocation.mapped_ptr().is_none() {
            return Err(RhiError::InvalidArgument(
                "cannot flush a buffer that is not host-visible".to_string(),
            ));
        }

        let atom = self.device.limits().non_coherent_atom_size.max(1);
        let aligned_offset = (allocation.offset() / atom) * atom;

        let range = vk::MappedMemoryRange::default()
            .memory(unsafe { allocation.memory() })
            .offset(aligned_offset)
            .size(vk::WHOLE_SIZE);

        unsafe {
            self.device
                .handle()
                .flush_mapped_memory_ranges(std::slice::from_ref(&range))?;
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Returns the buffer usage type.
    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Returns a descriptor buffer info covering the whole buffer.
    #[inline]
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::default()
            .buffer(self.buffer)
            .offset(0)
            .range(vk::WHOLE_SIZE)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Free allocation first, then destroy the buffer handle
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free buffer allocation: {:?}", e);
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed {} buffer", self.usage.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_usage_to_vk_usage() {
        assert!(
            BufferUsage::Vertex
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::VERTEX_BUFFER)
        );
        assert!(
            BufferUsage::Vertex
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::TRANSFER_DST)
        );
        assert!(
            BufferUsage::Index
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::INDEX_BUFFER)
        );
        assert!(
            BufferUsage::Index
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::TRANSFER_DST)
        );
        assert!(
            BufferUsage::Uniform
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::UNIFORM_BUFFER)
        );
        assert!(
            BufferUsage::Staging
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::TRANSFER_SRC)
        );
    }

    #[test]
    fn test_geometry_buffers_are_device_local() {
        assert_eq!(BufferUsage::Vertex.memory_location(), MemoryLocation::GpuOnly);
        assert_eq!(BufferUsage::Index.memory_location(), MemoryLocation::GpuOnly);
    }

    #[test]
    fn test_cpu_written_buffers_are_host_visible() {
        assert_eq!(
            BufferUsage::Uniform.memory_location(),
            MemoryLocation::CpuToGpu
        );
        assert_eq!(
            BufferUsage::Staging.memory_location(),
            MemoryLocation::CpuToGpu
        );
    }

    #[test]
    fn test_buffer_usage_name() {
        assert_eq!(BufferUsage::Vertex.name(), "vertex");
        assert_eq!(BufferUsage::Index.name(), "index");
        assert_eq!(BufferUsage::Uniform.name(), "uniform");
        assert_eq!(BufferUsage::Staging.name(), "staging");
    }
}
