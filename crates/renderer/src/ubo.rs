//! Per-frame uniform data shared by all shaders.
//!
//! The structures use `#[repr(C)]` for a predictable memory layout and
//! implement `bytemuck::Pod` so they can be copied into mapped uniform
//! buffers as raw bytes. Layouts follow std140 rules: `Mat4` is 64 bytes,
//! `Vec4` is 16 bytes, and the struct is padded to a 16-byte multiple.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use lantern_scene::Camera;

/// Maximum number of point lights the uniform block can carry per frame.
pub const MAX_POINT_LIGHTS: usize = 10;

/// One point light as seen by the shaders.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 16   | position (w unused) |
/// | 16     | 16   | color (w = intensity) |
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PointLightUbo {
    /// Light position in world space (w unused).
    pub position: Vec4,
    /// Light color; w carries the intensity.
    pub color: Vec4,
}

/// Global per-frame uniform data: camera matrices and lighting.
///
/// Written exactly once per frame into the current frame slot's uniform
/// buffer by the frame orchestrator.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | projection |
/// | 64     | 64   | view |
/// | 128    | 64   | inverse_view |
/// | 192    | 16   | ambient_color |
/// | 208    | 320  | point_lights |
/// | 528    | 4    | num_lights |
/// | 532    | 12   | padding |
///
/// Total size: 544 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUbo {
    /// Projection matrix (camera space to clip space).
    pub projection: Mat4,
    /// View matrix (world space to camera space).
    pub view: Mat4,
    /// Inverse view matrix; its translation is the camera position.
    pub inverse_view: Mat4,
    /// Ambient light color; w carries the ambient intensity.
    pub ambient_color: Vec4,
    /// Active point lights; only the first `num_lights` entries are valid.
    pub point_lights: [PointLightUbo; MAX_POINT_LIGHTS],
    /// Number of valid entries in `point_lights`.
    pub num_lights: u32,
    /// Padding to a 16-byte multiple.
    pub _padding: [u32; 3],
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            point_lights: [PointLightUbo::default(); MAX_POINT_LIGHTS],
            num_lights: 0,
            _padding: [0; 3],
        }
    }
}

impl GlobalUbo {
    /// Creates uniform data from the camera's current matrices.
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            projection: camera.projection(),
            view: camera.view(),
            inverse_view: camera.inverse_view(),
            ..Default::default()
        }
    }

    /// Appends a point light.
    ///
    /// Returns false (and drops the light) once the fixed capacity is
    /// reached.
    pub fn push_point_light(&mut self, position: Vec4, color: Vec4) -> bool {
        let slot = self.num_lights as usize;
        if slot >= MAX_POINT_LIGHTS {
            return false;
        }
        self.point_lights[slot] = PointLightUbo { position, color };
        self.num_lights += 1;
        true
    }

    /// Returns the size of this structure in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_point_light_ubo_size() {
        // Vec4 + Vec4 = 32 bytes
        assert_eq!(size_of::<PointLightUbo>(), 32);
    }

    #[test]
    fn test_global_ubo_size() {
        // 3 * Mat4 (192) + Vec4 (16) + 10 * 32 (320) + u32 + padding (16)
        assert_eq!(size_of::<GlobalUbo>(), 544);
        assert_eq!(GlobalUbo::size(), 544);
    }

    #[test]
    fn test_global_ubo_offsets() {
        assert_eq!(offset_of!(GlobalUbo, projection), 0);
        assert_eq!(offset_of!(GlobalUbo, view), 64);
        assert_eq!(offset_of!(GlobalUbo, inverse_view), 128);
        assert_eq!(offset_of!(GlobalUbo, ambient_color), 192);
        assert_eq!(offset_of!(GlobalUbo, point_lights), 208);
        assert_eq!(offset_of!(GlobalUbo, num_lights), 528);
    }

    #[test]
    fn test_push_point_light_respects_capacity() {
        let mut ubo = GlobalUbo::default();

        for i in 0..MAX_POINT_LIGHTS {
            assert!(ubo.push_point_light(
                Vec4::new(i as f32, 0.0, 0.0, 1.0),
                Vec4::ONE
            ));
        }
        assert_eq!(ubo.num_lights as usize, MAX_POINT_LIGHTS);

        // The eleventh light is dropped
        assert!(!ubo.push_point_light(Vec4::ZERO, Vec4::ONE));
        assert_eq!(ubo.num_lights as usize, MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_from_camera_copies_matrices() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(1.0, 1.5, 0.1, 50.0);
        camera.set_view_yxz(glam::Vec3::new(0.0, 1.0, -2.0), glam::Vec3::ZERO);

        let ubo = GlobalUbo::from_camera(&camera);
        assert_eq!(ubo.projection, camera.projection());
        assert_eq!(ubo.view, camera.view());
        assert_eq!(ubo.inverse_view, camera.inverse_view());
        assert_eq!(ubo.num_lights, 0);
    }

    #[test]
    fn test_bytemuck_cast() {
        let ubo = GlobalUbo::default();
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), GlobalUbo::size());
    }
}
