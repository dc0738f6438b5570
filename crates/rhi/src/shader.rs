//! Shader module loading.
//!
//! Shader compilation happens offline (GLSL -> SPIR-V via glslc); this
//! module only wraps loading pre-compiled SPIR-V into a VkShaderModule.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan shader module wrapper.
pub struct ShaderModule {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Creates a shader module from SPIR-V bytes.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bytes` - Raw SPIR-V binary (length must be a multiple of 4)
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid SPIR-V or module
    /// creation fails.
    pub fn from_bytes(device: Arc<Device>, bytes: &[u8]) -> RhiResult<Self> {
        let code = ash::util::read_spv(&mut Cursor::new(bytes))
            .map_err(|e| RhiError::Shader(format!("invalid SPIR-V: {}", e)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        debug!("Created shader module ({} bytes)", bytes.len());

        Ok(Self { device, module })
    }

    /// Creates a shader module from a SPIR-V file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid SPIR-V.
    pub fn from_file(device: Arc<Device>, path: &Path) -> RhiResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            RhiError::Shader(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(device, &bytes)
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Destroyed shader module");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_module_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ShaderModule>();
    }
}
