//! Depth buffer management.
//!
//! The depth buffer is a device-local image matching the swapchain extent.
//! It is recreated together with the swapchain on resize.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use lantern_rhi::device::Device;
use lantern_rhi::{RhiError, RhiResult};

/// Depth attachment format used by the renderer.
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Device-local depth attachment.
pub struct DepthBuffer {
    device: Arc<Device>,
    image: vk::Image,
    allocation: Option<Allocation>,
    view: vk::ImageView,
    extent: vk::Extent2D,
}

impl DepthBuffer {
    /// Creates a depth buffer matching the given extent.
    ///
    /// # Errors
    ///
    /// Returns an error if image, memory, or view creation fails. No
    /// partial resource survives a failure.
    pub fn new(device: Arc<Device>, extent: vk::Extent2D) -> RhiResult<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(DEPTH_FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation_result = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "depth buffer",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
        };

        let allocation = match allocation_result {
            Ok(allocation) => allocation,
            Err(err) => {
                unsafe { device.handle().destroy_image(image, None) };
                return Err(match err {
                    gpu_allocator::AllocationError::OutOfMemory => RhiError::ResourceExhausted {
                        what: "depth buffer",
                        size: requirements.size,
                    },
                    other => RhiError::Allocator(other),
                });
            }
        };

        if let Err(err) = unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())
        } {
            let mut allocator = device.allocator().lock().unwrap();
            let _ = allocator.free(allocation);
            drop(allocator);
            unsafe { device.handle().destroy_image(image, None) };
            return Err(err.into());
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = match unsafe { device.handle().create_image_view(&view_info, None) } {
            Ok(view) => view,
            Err(err) => {
                let mut allocator = device.allocator().lock().unwrap();
                let _ = allocator.free(allocation);
                drop(allocator);
                unsafe { device.handle().destroy_image(image, None) };
                return Err(err.into());
            }
        };

        debug!("Created {}x{} depth buffer", extent.width, extent.height);

        Ok(Self {
            device,
            image,
            allocation: Some(allocation),
            view,
            extent,
        })
    }

    /// Returns the depth image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the depth image view.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the depth attachment format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        DEPTH_FORMAT
    }

    /// Returns the depth buffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.handle().destroy_image_view(self.view, None);
            }
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free depth buffer allocation: {:?}", e);
            }
        }

        if self.image != vk::Image::null() {
            unsafe {
                self.device.handle().destroy_image(self.image, None);
            }
        }

        debug!("Destroyed depth buffer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_format_is_d32() {
        assert_eq!(DEPTH_FORMAT, vk::Format::D32_SFLOAT);
    }
}
