//! GPU mesh: device-local vertex/index buffers built from CPU mesh data.
//!
//! [`MeshData`] is the CPU-side description produced by the asset loaders:
//! an ordered vertex list plus an ordered 32-bit index list. [`Mesh`]
//! realizes that description as immutable device-local buffers through the
//! staged upload path.
//!
//! An index buffer only exists when the index list is non-empty; draw calls
//! pick the indexed or non-indexed path accordingly.

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandBuffer;
use crate::error::{RhiError, RhiResult};
use crate::staging::Uploader;
use crate::vertex::Vertex;

/// CPU-side mesh description.
///
/// Invariant (enforced by [`MeshData::validate`]): at least 3 vertices, and
/// every index refers to an existing vertex. Consumed once by
/// [`Mesh::new`] to produce GPU resources.
#[derive(Debug, Default, Clone)]
pub struct MeshData {
    /// Ordered vertex list (deduplicated by the loaders).
    pub vertices: Vec<Vertex>,
    /// Ordered index list; may be empty for non-indexed meshes.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates mesh data from vertex and index lists.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Number of indices.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Validates the builder invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] when:
    /// - there are fewer than 3 vertices (cannot form a triangle)
    /// - any index is out of range for the vertex list
    pub fn validate(&self) -> RhiResult<()> {
        if self.vertices.len() < 3 {
            return Err(RhiError::InvalidArgument(format!(
                "mesh needs at least 3 vertices, got {}",
                self.vertices.len()
            )));
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(RhiError::InvalidArgument(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            )));
        }

        Ok(())
    }
}

/// Immutable GPU mesh.
///
/// Exclusively owns one device-local vertex buffer and, when the source had
/// indices, one device-local index buffer. Never mutated after
/// construction, so it may be referenced by multiple scene objects and
/// multiple in-flight frames concurrently without locking. The owner must
/// not drop it while a submitted frame may still reference it; the
/// renderer guarantees this by waiting for device idle before tear-down.
pub struct Mesh {
    /// Device-local vertex buffer.
    vertex_buffer: Buffer,
    /// Device-local index buffer; `None` for non-indexed meshes.
    index_buffer: Option<Buffer>,
    /// Number of vertices in the vertex buffer.
    vertex_count: u32,
    /// Number of indices in the index buffer (0 if none).
    index_count: u32,
}

impl Mesh {
    /// Builds a GPU mesh from CPU mesh data.
    ///
    /// Vertex data, and index data when present, are staged to device-local
    /// buffers through the uploader. The upload blocks until the GPU copy
    /// completes.
    ///
    /// # Arguments
    ///
    /// * `uploader` - The staged upload engine
    /// * `data` - The mesh description to realize
    ///
    /// # Errors
    ///
    /// - [`RhiError::InvalidArgument`] if the data fails validation
    ///   (fewer than 3 vertices, index out of range)
    /// - [`RhiError::ResourceExhausted`] if device memory runs out; no
    ///   partial mesh is left behind
    pub fn new(uploader: &Uploader, data: &MeshData) -> RhiResult<Self> {
        data.validate()?;

        let vertex_buffer =
            uploader.upload_buffer(BufferUsage::Vertex, bytemuck::cast_slice(&data.vertices))?;

        // An index buffer is only created when the source actually has
        // indices; the vertex buffer drops via RAII if this fails
        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            Some(uploader.upload_buffer(BufferUsage::Index, bytemuck::cast_slice(&data.indices))?)
        };

        debug!(
            "Built mesh: {} vertices, {} indices",
            data.vertex_count(),
            data.index_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: data.vertex_count(),
            index_count: data.index_count(),
        })
    }

    /// Returns true if this mesh draws through an index buffer.
    #[inline]
    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices (0 for non-indexed meshes).
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds the vertex buffer, and the index buffer when present, to the
    /// command buffer.
    pub fn bind(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);

        if let Some(index_buffer) = &self.index_buffer {
            cmd.bind_index_buffer(index_buffer.handle(), 0, vk::IndexType::UINT32);
        }
    }

    /// Records the draw call for this mesh.
    ///
    /// Uses the indexed draw path iff the mesh has an index buffer.
    /// [`bind`](Self::bind) must have been called on the same command
    /// buffer first.
    pub fn draw(&self, cmd: &CommandBuffer) {
        if self.has_index_buffer() {
            cmd.draw_indexed(self.index_count, 1, 0, 0, 0);
        } else {
            cmd.draw(self.vertex_count, 1, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn vertex_at(x: f32) -> Vertex {
        Vertex::new(Vec3::new(x, 0.0, 0.0), Vec3::ONE, Vec3::ZERO, Vec2::ZERO)
    }

    #[test]
    fn test_validate_rejects_too_few_vertices() {
        for count in 0..3 {
            let data = MeshData::new((0..count).map(|i| vertex_at(i as f32)).collect(), vec![]);
            match data.validate() {
                Err(RhiError::InvalidArgument(_)) => {}
                other => panic!("expected InvalidArgument for {} vertices, got {:?}", count, other),
            }
        }
    }

    #[test]
    fn test_validate_accepts_three_collinear_distinct_vertices() {
        // Collinear but structurally distinct positions are fine
        let data = MeshData::new(
            vec![vertex_at(0.0), vertex_at(1.0), vertex_at(2.0)],
            vec![0, 1, 2],
        );
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_empty_index_list() {
        let data = MeshData::new(vec![vertex_at(0.0), vertex_at(1.0), vertex_at(2.0)], vec![]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let data = MeshData::new(
            vec![vertex_at(0.0), vertex_at(1.0), vertex_at(2.0)],
            vec![0, 1, 3],
        );
        match data.validate() {
            Err(RhiError::InvalidArgument(message)) => {
                assert!(message.contains("out of range"));
            }
            other => panic!("expected InvalidArgument, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_mesh_data_counts() {
        let data = MeshData::new(
            vec![vertex_at(0.0), vertex_at(1.0), vertex_at(2.0)],
            vec![0, 1, 2, 0, 2, 1],
        );
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.index_count(), 6);
    }
}
