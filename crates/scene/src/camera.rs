//! Camera matrices.
//!
//! The camera owns the view, projection, and inverse-view matrices that the
//! frame orchestrator copies into the per-frame uniform data. Input
//! handling and movement are the caller's business; this type only does
//! the matrix math.

use glam::{EulerRot, Mat4, Vec3};

/// Perspective camera.
#[derive(Clone, Debug)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Create a camera with identity matrices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a perspective projection.
    ///
    /// Uses a right-handed projection with a \[0, 1\] depth range, matching
    /// Vulkan's clip space.
    ///
    /// # Arguments
    /// * `fovy` - Vertical field of view in radians
    /// * `aspect` - Width / height aspect ratio
    /// * `near` - Near plane distance
    /// * `far` - Far plane distance
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective_rh(fovy, aspect, near, far);
    }

    /// Set the view matrix from a position and YXZ Euler rotation.
    ///
    /// The rotation is applied yaw (Y) first, then pitch (X), then roll
    /// (Z), matching a fly-camera controller that stores per-axis angles.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let orientation = glam::Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z);
        let camera_to_world = Mat4::from_rotation_translation(orientation, position);
        self.inverse_view = camera_to_world;
        self.view = camera_to_world.inverse();
    }

    /// Returns the projection matrix.
    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Returns the view matrix (world space to camera space).
    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Returns the inverse view matrix (camera space to world space).
    ///
    /// Its translation column is the camera's world position, which the
    /// shaders use for specular lighting.
    #[inline]
    pub fn inverse_view(&self) -> Mat4 {
        self.inverse_view
    }

    /// Returns the camera position in world space.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.inverse_view.w_axis.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq_mat4(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < EPSILON)
    }

    #[test]
    fn test_view_at_origin_no_rotation_is_identity() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::ZERO, Vec3::ZERO);
        assert!(approx_eq_mat4(camera.view(), Mat4::IDENTITY));
    }

    #[test]
    fn test_inverse_view_inverts_view() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::new(1.0, 2.0, -3.0), Vec3::new(0.2, 0.7, 0.0));

        let product = camera.view() * camera.inverse_view();
        assert!(approx_eq_mat4(product, Mat4::IDENTITY));
    }

    #[test]
    fn test_position_matches_set_view() {
        let mut camera = Camera::new();
        let position = Vec3::new(4.0, -1.0, 2.5);
        camera.set_view_yxz(position, Vec3::new(0.1, 0.3, 0.0));
        assert!((camera.position() - position).length() < EPSILON);
    }

    #[test]
    fn test_perspective_projection_maps_near_plane_to_zero() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);

        // A point on the near plane maps to depth 0
        let near_point = camera
            .projection()
            .project_point3(Vec3::new(0.0, 0.0, -0.1));
        assert!(near_point.z.abs() < 1e-4);
    }
}
