//! GPU image (texture) management.
//!
//! This module owns the image creation path: allocate a device-local image,
//! move it through its layout state machine with explicit pipeline
//! barriers, copy staged pixels into it, and expose a shader-visible view
//! plus a sampler.
//!
//! # Layout state machine
//!
//! An image starts [`ImageLayoutState::Undefined`] right after allocation.
//! Exactly two transitions are supported:
//!
//! ```text
//! Undefined -> TransferDestination -> ShaderReadOnly
//! ```
//!
//! Each transition is an explicit barrier carrying the access masks and
//! pipeline stages for that edge. Requesting any other pair is a programmer
//! error and fails loudly with [`RhiError::UnsupportedTransition`] rather
//! than guessing barrier flags.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::staging::Uploader;

/// Pixel format for all sampled textures: 8 bits per channel RGBA,
/// sRGB-encoded.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Bytes per pixel for [`TEXTURE_FORMAT`].
pub const TEXTURE_BYTES_PER_PIXEL: u32 = 4;

/// Abstract layout state of a GPU image.
///
/// Mirrors the subset of Vulkan image layouts this renderer actually moves
/// images through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageLayoutState {
    /// Initial state right after allocation; contents undefined.
    Undefined,
    /// Ready to receive a transfer write (staged pixel copy).
    TransferDestination,
    /// Terminal steady state for sampling from shaders.
    ShaderReadOnly,
}

impl ImageLayoutState {
    /// Converts to the corresponding Vulkan image layout.
    pub fn to_vk(self) -> vk::ImageLayout {
        match self {
            ImageLayoutState::Undefined => vk::ImageLayout::UNDEFINED,
            ImageLayoutState::TransferDestination => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ImageLayoutState::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

/// Access masks and pipeline stages for one layout transition edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionMasks {
    /// Accesses that must complete before the transition.
    pub src_access: vk::AccessFlags,
    /// Accesses that wait for the transition.
    pub dst_access: vk::AccessFlags,
    /// Pipeline stage the source accesses happen in.
    pub src_stage: vk::PipelineStageFlags,
    /// Pipeline stage the destination accesses happen in.
    pub dst_stage: vk::PipelineStageFlags,
}

/// Returns the barrier masks for a layout transition.
///
/// Only the two transitions of the upload sequence are defined. Any other
/// pair fails with [`RhiError::UnsupportedTransition`].
///
/// # Errors
///
/// [`RhiError::UnsupportedTransition`] for any pair other than
/// `Undefined -> TransferDestination` and
/// `TransferDestination -> ShaderReadOnly`.
pub fn transition_masks(
    from: ImageLayoutState,
    to: ImageLayoutState,
) -> RhiResult<TransitionMasks> {
    match (from, to) {
        (ImageLayoutState::Undefined, ImageLayoutState::TransferDestination) => {
            Ok(TransitionMasks {
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::TRANSFER_WRITE,
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::TRANSFER,
            })
        }
        (ImageLayoutState::TransferDestination, ImageLayoutState::ShaderReadOnly) => {
            Ok(TransitionMasks {
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            })
        }
        (from, to) => Err(RhiError::UnsupportedTransition { from, to }),
    }
}

/// Subresource range covering the single color mip/layer of a texture.
fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Builds the image memory barrier for a validated transition.
fn layout_barrier(
    image: vk::Image,
    from: ImageLayoutState,
    to: ImageLayoutState,
    masks: &TransitionMasks,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .old_layout(from.to_vk())
        .new_layout(to.to_vk())
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_subresource_range())
        .src_access_mask(masks.src_access)
        .dst_access_mask(masks.dst_access)
}

/// RAII guard for an image handle plus its allocation during construction.
///
/// If texture construction fails partway, dropping this guard releases the
/// image and its memory so no half-constructed resource leaks.
struct ImageAlloc {
    device: Arc<Device>,
    image: vk::Image,
    allocation: Option<Allocation>,
}

impl ImageAlloc {
    fn new(device: Arc<Device>, width: u32, height: u32) -> RhiResult<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(TEXTURE_FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation_result = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "texture",
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
                        what: "texture",
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

        Ok(Self {
            device,
            image,
            allocation: Some(allocation),
        })
    }

    /// Hands the image and allocation over to the finished texture.
    fn release(mut self) -> (vk::Image, Allocation) {
        let image = std::mem::replace(&mut self.image, vk::Image::null());
        let allocation = self.allocation.take().expect("allocation already taken");
        (image, allocation)
    }
}

impl Drop for ImageAlloc {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free image allocation: {:?}", e);
            }
        }
        if self.image != vk::Image::null() {
            unsafe {
                self.device.handle().destroy_image(self.image, None);
            }
        }
    }
}

/// Sampled GPU texture.
///
/// Exclusively owns an image, its backing memory, a shader-visible view,
/// and a sampler. Write-once: the pixel contents and layout never change
/// after construction, so textures may be shared across scene objects and
/// frames without locking.
pub struct Texture {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Backing memory allocation.
    allocation: Option<Allocation>,
    /// Shader-visible view of the image.
    view: vk::ImageView,
    /// Sampler used to read the image from shaders.
    sampler: vk::Sampler,
    /// Current layout state; `ShaderReadOnly` after construction.
    layout: ImageLayoutState,
    /// Image dimensions.
    extent: vk::Extent2D,
}

impl Texture {
    /// Creates a sampled texture from raw RGBA pixels.
    ///
    /// Runs the full upload sequence: allocate the device-local image,
    /// transition `Undefined -> TransferDestination`, copy the staged
    /// pixels, transition `TransferDestination -> ShaderReadOnly`, then
    /// create the view and the sampler (linear filtering, repeat
    /// addressing, anisotropy at the device's reported maximum, no
    /// mipmapping). The whole sequence is recorded into one fenced
    /// submission through the uploader.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `uploader` - The staged upload engine
    /// * `width` - Image width in pixels (non-zero)
    /// * `height` - Image height in pixels (non-zero)
    /// * `pixels` - Tightly packed RGBA bytes, `width * height * 4` long
    ///
    /// # Errors
    ///
    /// - [`RhiError::InvalidArgument`] for zero dimensions or a pixel span
    ///   whose length does not match the dimensions
    /// - [`RhiError::ResourceExhausted`] if device memory cannot be
    ///   allocated
    ///
    /// On failure no partially constructed texture survives.
    pub fn from_pixels(
        device: Arc<Device>,
        uploader: &Uploader,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidArgument(format!(
                "texture dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let expected = width as usize * height as usize * TEXTURE_BYTES_PER_PIXEL as usize;
        if pixels.len() != expected {
            return Err(RhiError::InvalidArgument(format!(
                "pixel span is {} bytes, expected {} for {}x{} RGBA",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        // Validate both transition edges before recording anything
        let to_transfer = transition_masks(
            ImageLayoutState::Undefined,
            ImageLayoutState::TransferDestination,
        )?;
        let to_shader = transition_masks(
            ImageLayoutState::TransferDestination,
            ImageLayoutState::ShaderReadOnly,
        )?;

        let raw = ImageAlloc::new(device.clone(), width, height)?;

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D::default())
            .image_extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            });

        uploader.one_shot(|cmd| {
            cmd.pipeline_barrier(
                to_transfer.src_stage,
                to_transfer.dst_stage,
                &[layout_barrier(
                    raw.image,
                    ImageLayoutState::Undefined,
                    ImageLayoutState::TransferDestination,
                    &to_transfer,
                )],
            );
            cmd.copy_buffer_to_image(
                staging.handle(),
                raw.image,
                ImageLayoutState::TransferDestination.to_vk(),
                &[region],
            );
            cmd.pipeline_barrier(
                to_shader.src_stage,
                to_shader.dst_stage,
                &[layout_barrier(
                    raw.image,
                    ImageLayoutState::TransferDestination,
                    ImageLayoutState::ShaderReadOnly,
                    &to_shader,
                )],
            );
        })?;

        let view = create_image_view(&device, raw.image)?;

        let sampler = match create_sampler(&device) {
            Ok(sampler) => sampler,
            Err(err) => {
                unsafe { device.handle().destroy_image_view(view, None) };
                return Err(err);
            }
        };

        let (image, allocation) = raw.release();

        debug!("Created {}x{} texture", width, height);

        Ok(Self {
            device,
            image,
            allocation: Some(allocation),
            view,
            sampler,
            layout: ImageLayoutState::ShaderReadOnly,
            extent: vk::Extent2D { width, height },
        })
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    /// Returns the shader-visible image view.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the sampler.
    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Returns the current layout state.
    #[inline]
    pub fn layout(&self) -> ImageLayoutState {
        self.layout
    }

    /// Returns the image dimensions.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns a descriptor image info for a combined image sampler binding.
    #[inline]
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler)
            .image_view(self.view)
            .image_layout(self.layout.to_vk())
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.sampler != vk::Sampler::null() {
                self.device.handle().destroy_sampler(self.sampler, None);
            }
            if self.view != vk::ImageView::null() {
                self.device.handle().destroy_image_view(self.view, None);
            }
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free texture allocation: {:?}", e);
            }
        }

        if self.image != vk::Image::null() {
            unsafe {
                self.device.handle().destroy_image(self.image, None);
            }
        }

        debug!("Destroyed texture");
    }
}

/// Creates a 2D color view of a texture image.
fn create_image_view(device: &Arc<Device>, image: vk::Image) -> RhiResult<vk::ImageView> {
    let view_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(TEXTURE_FORMAT)
        .subresource_range(color_subresource_range());

    let view = unsafe { device.handle().create_image_view(&view_info, None)? };
    Ok(view)
}

/// Creates the texture sampler: linear filtering, repeat addressing on all
/// axes, anisotropy at the device maximum, no mipmapping.
fn create_sampler(device: &Arc<Device>) -> RhiResult<vk::Sampler> {
    let sampler_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(device.max_sampler_anisotropy())
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0);

    let sampler = unsafe { device.handle().create_sampler(&sampler_info, None)? };
    Ok(sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_state_to_vk() {
        assert_eq!(
            ImageLayoutState::Undefined.to_vk(),
            vk::ImageLayout::UNDEFINED
        );
        assert_eq!(
            ImageLayoutState::TransferDestination.to_vk(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL
        );
        assert_eq!(
            ImageLayoutState::ShaderReadOnly.to_vk(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }

    #[test]
    fn test_transition_undefined_to_transfer() {
        let masks = transition_masks(
            ImageLayoutState::Undefined,
            ImageLayoutState::TransferDestination,
        )
        .unwrap();

        assert_eq!(masks.src_access, vk::AccessFlags::empty());
        assert_eq!(masks.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::TRANSFER);
    }

    #[test]
    fn test_transition_transfer_to_shader_read() {
        let masks = transition_masks(
            ImageLayoutState::TransferDestination,
            ImageLayoutState::ShaderReadOnly,
        )
        .unwrap();

        assert_eq!(masks.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }

    #[test]
    fn test_unsupported_transitions_fail() {
        let illegal = [
            (ImageLayoutState::ShaderReadOnly, ImageLayoutState::TransferDestination),
            (ImageLayoutState::ShaderReadOnly, ImageLayoutState::Undefined),
            (ImageLayoutState::Undefined, ImageLayoutState::ShaderReadOnly),
            (ImageLayoutState::TransferDestination, ImageLayoutState::Undefined),
            (ImageLayoutState::Undefined, ImageLayoutState::Undefined),
            (ImageLayoutState::ShaderReadOnly, ImageLayoutState::ShaderReadOnly),
        ];

        for (from, to) in illegal {
            match transition_masks(from, to) {
                Err(RhiError::UnsupportedTransition { from: f, to: t }) => {
                    assert_eq!(f, from);
                    assert_eq!(t, to);
                }
                other => panic!("expected UnsupportedTransition for {:?} -> {:?}, got {:?}", from, to, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_upload_transition_chain_ends_shader_read_only() {
        // Walk the exact sequence the upload path records
        let mut state = ImageLayoutState::Undefined;

        for next in [
            ImageLayoutState::TransferDestination,
            ImageLayoutState::ShaderReadOnly,
        ] {
            transition_masks(state, next).unwrap();
            state = next;
        }

        assert_eq!(state, ImageLayoutState::ShaderReadOnly);
    }

    #[test]
    fn test_texture_format_is_srgb_rgba8() {
        assert_eq!(TEXTURE_FORMAT, vk::Format::R8G8B8A8_SRGB);
        assert_eq!(TEXTURE_BYTES_PER_PIXEL, 4);
    }
}
