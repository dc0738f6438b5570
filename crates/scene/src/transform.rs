//! Transform component for scene objects.

use glam::{Mat4, Quat, Vec3};

/// A transform representing translation, rotation, and scale.
#[derive(Clone, Debug)]
pub struct Transform {
    /// Translation in world space
    pub translation: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with the given translation.
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Create a transform with the given rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Create a transform with the given scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Get the model matrix (object space to world space).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Get the normal matrix (inverse transpose of the model matrix).
    ///
    /// The normal matrix transforms normal vectors correctly when the model
    /// matrix contains non-uniform scaling.
    ///
    /// # Non-invertible transforms
    ///
    /// If the transform is not invertible (e.g., contains zero scale), the
    /// identity matrix is returned as a fallback to avoid NaN/Inf values
    /// propagating to shaders.
    pub fn normal_matrix(&self) -> Mat4 {
        let model = self.matrix();

        const EPSILON: f32 = 1e-6;
        let det = model.determinant();

        if det.abs() < EPSILON {
            Mat4::IDENTITY
        } else {
            model.inverse().transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_transform_default() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_transform_builder() {
        let t = Transform::new()
            .with_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::splat(2.0));

        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_matrix_applies_translation() {
        let t = Transform::new().with_translation(Vec3::new(10.0, 0.0, 0.0));
        let pos = t.matrix().transform_point3(Vec3::ZERO);
        assert!(approx_eq_vec3(pos, Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_matrix_applies_scale_then_translation() {
        let t = Transform::new()
            .with_translation(Vec3::new(10.0, 0.0, 0.0))
            .with_scale(Vec3::splat(2.0));
        let pos = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx_eq_vec3(pos, Vec3::new(12.0, 0.0, 0.0)));
    }

    #[test]
    fn test_normal_matrix_identity() {
        let t = Transform::default();
        assert_eq!(t.normal_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_with_scale() {
        let t = Transform::new().with_scale(Vec3::new(1.0, 2.0, 1.0));
        let expected = t.matrix().inverse().transpose();
        assert_eq!(t.normal_matrix(), expected);
    }

    #[test]
    fn test_normal_matrix_non_invertible() {
        // Zero scale makes the transform non-invertible
        let t = Transform::new().with_scale(Vec3::ZERO);
        let normal = t.normal_matrix();

        assert_eq!(normal, Mat4::IDENTITY);

        let cols = [normal.x_axis, normal.y_axis, normal.z_axis, normal.w_axis];
        for col in cols {
            assert!(!col.x.is_nan());
            assert!(!col.y.is_nan());
            assert!(!col.z.is_nan());
            assert!(!col.w.is_nan());
        }
    }
}
