//! Physical device (GPU) selection.
//!
//! This module handles GPU enumeration and selection based on capabilities.
//!
//! # Overview
//!
//! The physical device selection process involves:
//! 1. Enumerating all available GPUs
//! 2. Checking each GPU for required queue families (graphics, present)
//! 3. Verifying required device features (sampler anisotropy)
//! 4. Selecting the most suitable GPU (preferring discrete GPUs)

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Queue family indices for different queue types.
///
/// Vulkan devices can have multiple queue families, each supporting
/// different operations (graphics, transfer, presentation).
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueFamilyIndices {
    /// Index of the queue family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family that supports presentation to a surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Checks if the minimum required queue families are available.
    ///
    /// For rendering, we need at least graphics and present queue families.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns the unique queue family indices as a vector.
    ///
    /// This is useful when creating logical devices to avoid creating
    /// duplicate queues for the same family.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family {
            if !families.contains(&present) {
                families.push(present);
            }
        }

        families
    }
}

/// Information about a physical device (GPU).
///
/// This struct contains all the information needed to create a logical
/// device and perform rendering operations.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Memory properties (heap sizes, memory types).
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Queue family indices for different operations.
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }

    /// Returns the maximum sampler anisotropy supported by the device.
    ///
    /// Samplers created by the image manager enable anisotropic filtering
    /// at this level.
    #[inline]
    pub fn max_sampler_anisotropy(&self) -> f32 {
        self.properties.limits.max_sampler_anisotropy
    }

    /// Returns the Vulkan API version supported by the device.
    pub fn api_version(&self) -> (u32, u32, u32) {
        let version = self.properties.api_version;
        (
            vk::api_version_major(version),
            vk::api_version_minor(version),
            vk::api_version_patch(version),
        )
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.api_version();
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("api_version", &format!("{}.{}.{}", major, minor, patch))
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the most suitable physical device for rendering.
///
/// This function enumerates all available GPUs and selects one based on:
/// 1. Required queue family support (graphics and present)
/// 2. Required feature support (sampler anisotropy)
/// 3. Device type preference (discrete GPU preferred)
///
/// # Arguments
///
/// * `instance` - The Vulkan instance
/// * `surface` - The window surface for present support checking
/// * `surface_loader` - The surface extension loader
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no suitable GPU is found.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let mut suitable_devices: Vec<(PhysicalDeviceInfo, u32)> = Vec::new();

    for device in devices {
        if let Some(info) = check_device_suitability(instance, device, surface, surface_loader) {
            let score = rate_device(&info);
            debug!(
                "GPU '{}' ({}) - score: {}",
                info.device_name(),
                info.device_type_name(),
                score
            );
            suitable_devices.push((info, score));
        }
    }

    if suitable_devices.is_empty() {
        warn!("No suitable GPU found with required capabilities");
        return Err(RhiError::NoSuitableGpu);
    }

    suitable_devices.sort_by(|a, b| b.1.cmp(&a.1));
    let (selected, score) = suitable_devices.remove(0);

    let (major, minor, patch) = selected.api_version();
    info!(
        "Selected GPU: '{}' ({}) - Vulkan {}.{}.{}, score: {}",
        selected.device_name(),
        selected.device_type_name(),
        major,
        minor,
        patch,
        score
    );

    Ok(selected)
}

/// Checks whether a physical device meets the renderer's requirements.
///
/// Returns `None` if the device is unsuitable.
fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<PhysicalDeviceInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };
    let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };

    // Anisotropic sampling is required by the texture sampler setup
    if features.sampler_anisotropy == vk::FALSE {
        debug!("Rejecting device: no sampler anisotropy support");
        return None;
    }

    if !supports_swapchain_extension(instance, device) {
        debug!("Rejecting device: no swapchain extension");
        return None;
    }

    let queue_families = find_queue_families(instance, device, surface, surface_loader);
    if !queue_families.is_complete() {
        debug!("Rejecting device: incomplete queue families");
        return None;
    }

    Some(PhysicalDeviceInfo {
        device,
        properties,
        features,
        memory_properties,
        queue_families,
    })
}

/// Finds the graphics and present queue family indices for a device.
fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();

    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    for (i, family) in families.iter().enumerate() {
        let index = i as u32;

        if indices.graphics_family.is_none()
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics_family = Some(index);
        }

        if indices.present_family.is_none() {
            let supported = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .unwrap_or(false)
            };
            if supported {
                indices.present_family = Some(index);
            }
        }

        if indices.is_complete() {
            break;
        }
    }

    indices
}

/// Checks whether the device supports the swapchain extension.
fn supports_swapchain_extension(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    let extensions = match unsafe { instance.enumerate_device_extension_properties(device) } {
        Ok(extensions) => extensions,
        Err(_) => return false,
    };

    let swapchain_name = ash::khr::swapchain::NAME.to_bytes_with_nul();

    extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name.to_bytes_with_nul() == swapchain_name
    })
}

/// Rates a device by desirability. Higher is better.
fn rate_device(info: &PhysicalDeviceInfo) -> u32 {
    let mut score = 0;

    match info.properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => score += 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => score += 100,
        _ => score += 10,
    }

    // Larger image dimension limits as a tiebreaker
    score += info.properties.limits.max_image_dimension2_d / 1024;

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_family_indices_complete() {
        let mut indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());

        indices.graphics_family = Some(0);
        assert!(!indices.is_complete());

        indices.present_family = Some(0);
        assert!(indices.is_complete());
    }

    #[test]
    fn test_unique_families_deduplicates() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert_eq!(indices.unique_families(), vec![0]);

        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(indices.unique_families(), vec![0, 2]);
    }

    #[test]
    fn test_unique_families_empty_when_unset() {
        let indices = QueueFamilyIndices::default();
        assert!(indices.unique_families().is_empty());
    }
}
