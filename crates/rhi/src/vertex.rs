//! Vertex data structure and input descriptions.
//!
//! This module defines the vertex format used in the renderer.
//!
//! The vertex carries position, color, normal, and texture coordinate. It
//! doubles as the deduplication key during mesh loading: equality is
//! structural over all four fields and the hash is computed from their bit
//! patterns, so identical attribute combinations collapse to one entry in a
//! `HashMap<Vertex, u32>`.

use std::hash::{Hash, Hasher};

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Standard vertex format with position, color, normal, and UV.
///
/// # Memory Layout
///
/// The struct uses `#[repr(C)]` to ensure predictable memory layout:
/// - Offset 0: position (12 bytes)
/// - Offset 12: color (12 bytes)
/// - Offset 24: normal (12 bytes)
/// - Offset 36: uv (8 bytes)
/// - Total size: 44 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: color (vec3)
/// - location 2: normal (vec3)
/// - location 3: uv (vec2)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// Per-vertex RGB color.
    pub color: Vec3,
    /// Surface normal vector; zero when the source has none.
    pub normal: Vec3,
    /// Texture coordinates; zero when the source has none.
    pub uv: Vec2,
}

impl Vertex {
    /// Creates a new vertex with the specified attributes.
    #[inline]
    pub const fn new(position: Vec3, color: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    ///
    /// Returns a binding description for binding 0 with per-vertex input
    /// rate.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // Color at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            // Normal at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 24,
            },
            // UV at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32_SFLOAT,
                offset: 36,
            },
        ]
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.color == other.color
            && self.normal == other.normal
            && self.uv == other.uv
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the bit patterns so the hash is stable and consistent with
        // structural equality for parsed attribute data
        for f in [
            self.position.x,
            self.position.y,
            self.position.z,
            self.color.x,
            self.color.y,
            self.color.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.uv.x,
            self.uv.y,
        ] {
            f.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_vertex_size() {
        // Vec3 (12) + Vec3 (12) + Vec3 (12) + Vec2 (8) = 44 bytes
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::size(), 44);
    }

    #[test]
    fn test_vertex_binding_description() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 44);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_vertex_attribute_descriptions() {
        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs.len(), 4);

        // Position (location 0)
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);

        // Color (location 1)
        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[1].offset, 12);

        // Normal (location 2)
        assert_eq!(attrs[2].location, 2);
        assert_eq!(attrs[2].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[2].offset, 24);

        // UV (location 3)
        assert_eq!(attrs[3].location, 3);
        assert_eq!(attrs[3].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[3].offset, 36);
    }

    #[test]
    fn test_vertex_offsets() {
        use std::mem::offset_of;

        assert_eq!(offset_of!(Vertex, position), 0);
        assert_eq!(offset_of!(Vertex, color), 12);
        assert_eq!(offset_of!(Vertex, normal), 24);
        assert_eq!(offset_of!(Vertex, uv), 36);
    }

    #[test]
    fn test_vertex_default_is_zero() {
        let vertex = Vertex::default();
        assert_eq!(vertex.position, Vec3::ZERO);
        assert_eq!(vertex.color, Vec3::ZERO);
        assert_eq!(vertex.normal, Vec3::ZERO);
        assert_eq!(vertex.uv, Vec2::ZERO);
    }

    #[test]
    fn test_structural_equality() {
        let a = Vertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::ONE,
            Vec3::Y,
            Vec2::new(0.25, 0.75),
        );
        let b = a;
        assert_eq!(a, b);

        let mut c = a;
        c.uv.y = 0.5;
        assert_ne!(a, c);
    }

    #[test]
    fn test_vertex_as_hash_map_key() {
        let a = Vertex::new(Vec3::X, Vec3::ONE, Vec3::Z, Vec2::ZERO);
        let duplicate = a;
        let different = Vertex::new(Vec3::Y, Vec3::ONE, Vec3::Z, Vec2::ZERO);

        let mut map: HashMap<Vertex, u32> = HashMap::new();
        map.insert(a, 0);

        assert_eq!(map.get(&duplicate), Some(&0));
        assert_eq!(map.get(&different), None);

        map.insert(different, 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_vertex_pod_cast() {
        let vertex = Vertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.5, 0.6, 0.7),
            Vec3::Y,
            Vec2::new(0.5, 0.5),
        );

        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 44);

        let back: &Vertex = bytemuck::from_bytes(bytes);
        assert_eq!(*back, vertex);
    }
}
