//! Light definitions for the scene.

use glam::Vec3;

/// A point light (omnidirectional).
///
/// The world-space position comes from the owning scene object's
/// transform; this struct carries the light's attributes only.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Billboard radius used when drawing the light
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            radius: 0.1,
        }
    }
}

impl PointLight {
    /// Create a point light with the given intensity and default color and
    /// radius.
    pub fn with_intensity(intensity: f32) -> Self {
        Self {
            intensity,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_is_white() {
        let light = PointLight::default();
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.intensity, 1.0);
    }

    #[test]
    fn test_with_intensity() {
        let light = PointLight::with_intensity(0.2);
        assert_eq!(light.intensity, 0.2);
        assert_eq!(light.color, Vec3::ONE);
    }
}
