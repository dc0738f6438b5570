//! OBJ mesh loading with content-addressed vertex deduplication.
//!
//! OBJ files index positions, normals, and texture coordinates separately
//! per face corner, so the same attribute combination is typically repeated
//! many times across faces. The loader collapses those repeats: each
//! distinct (position, color, normal, uv) combination gets exactly one
//! entry in the output vertex list, keyed by the full structural vertex in
//! a hash map rather than by source indices. The output is an index-buffer
//! mesh with no duplicate vertices.
//!
//! Attribute defaults when the source lacks a channel:
//! - color: opaque white
//! - normal: zero vector
//! - uv: zero vector
//!
//! The texture V coordinate is flipped (`v' = 1 - v`) to match the
//! top-left row origin of the uploaded images.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use ahash::AHashMap;
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use lantern_rhi::mesh::MeshData;
use lantern_rhi::vertex::Vertex;

use crate::error::{ResourceError, ResourceResult};

/// Loads an OBJ file into deduplicated mesh data.
///
/// # Arguments
/// * `path` - Path to the .obj file
///
/// # Errors
/// Returns an error if the file is missing, unreadable, fails to parse, or
/// contains no geometry.
pub fn load_obj(path: &Path) -> ResourceResult<MeshData> {
    if !path.exists() {
        return Err(ResourceError::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let data = load_obj_from(&mut bytes.as_slice())?;

    info!(
        "Loaded {}: {} vertices, {} indices",
        path.display(),
        data.vertex_count(),
        data.index_count()
    );

    Ok(data)
}

/// Loads OBJ data from a reader into deduplicated mesh data.
///
/// Material libraries referenced by the source are ignored; per-vertex
/// colors embedded in `v` statements are honored.
///
/// # Errors
/// Returns an error if parsing fails or the source contains no geometry.
pub fn load_obj_from(reader: &mut impl BufRead) -> ResourceResult<MeshData> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj_buf(reader, &load_options, |_| {
        // Material definitions are irrelevant here
        Ok((Vec::new(), AHashMap::new()))
    })
    .map_err(|e| ResourceError::ObjParse(e.to_string()))?;

    let data = build_mesh_data(&models);

    if data.vertices.is_empty() {
        return Err(ResourceError::EmptyMesh);
    }

    Ok(data)
}

/// Builds deduplicated mesh data from parsed OBJ models.
///
/// The deduplication map spans all models, so identical vertices shared
/// between shapes also collapse.
fn build_mesh_data(models: &[tobj::Model]) -> MeshData {
    let mut unique_vertices: HashMap<Vertex, u32> = HashMap::new();
    let mut data = MeshData::default();
    let mut face_references = 0usize;

    for model in models {
        let mesh = &model.mesh;

        // With single_index disabled, the normal/texcoord index streams
        // parallel the position index stream when the channel is present
        let has_normals =
            !mesh.normals.is_empty() && mesh.normal_indices.len() == mesh.indices.len();
        let has_texcoords =
            !mesh.texcoords.is_empty() && mesh.texcoord_indices.len() == mesh.indices.len();
        // Per-vertex colors parallel the position array, three floats per
        // vertex
        let has_colors = mesh.vertex_color.len() == mesh.positions.len()
            && !mesh.vertex_color.is_empty();

        for (corner, &position_index) in mesh.indices.iter().enumerate() {
            let pi = position_index as usize;

            let position = Vec3::new(
                mesh.positions[3 * pi],
                mesh.positions[3 * pi + 1],
                mesh.positions[3 * pi + 2],
            );

            let color = if has_colors {
                Vec3::new(
                    mesh.vertex_color[3 * pi],
                    mesh.vertex_color[3 * pi + 1],
                    mesh.vertex_color[3 * pi + 2],
                )
            } else {
                // Opaque white when the source has no color channel
                Vec3::ONE
            };

            let normal = if has_normals {
                let ni = mesh.normal_indices[corner] as usize;
                Vec3::new(
                    mesh.normals[3 * ni],
                    mesh.normals[3 * ni + 1],
                    mesh.normals[3 * ni + 2],
                )
            } else {
                Vec3::ZERO
            };

            let uv = if has_texcoords {
                let ti = mesh.texcoord_indices[corner] as usize;
                // Flip V to match the image row convention
                Vec2::new(mesh.texcoords[2 * ti], 1.0 - mesh.texcoords[2 * ti + 1])
            } else {
                Vec2::ZERO
            };

            let vertex = Vertex::new(position, color, normal, uv);

            let index = match unique_vertices.get(&vertex) {
                Some(&existing) => existing,
                None => {
                    let assigned = data.vertices.len() as u32;
                    unique_vertices.insert(vertex, assigned);
                    data.vertices.push(vertex);
                    assigned
                }
            };
            data.indices.push(index);
            face_references += 1;
        }
    }

    debug!(
        "Deduplicated {} face references into {} vertices",
        face_references,
        data.vertices.len()
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> MeshData {
        load_obj_from(&mut source.as_bytes()).expect("OBJ source should parse")
    }

    #[test]
    fn test_opposite_winding_faces_share_vertices() {
        // Two faces over the same 3 unique attribute sets: dedup yields 3
        // vertices, and indices follow first-seen assignment order
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             f 1 2 3\n\
             f 1 3 2\n",
        );

        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.index_count(), 6);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 1]);
    }

    #[test]
    fn test_duplicate_position_entries_collapse() {
        // The fourth `v` repeats the first; faces referencing either
        // resolve to the same output vertex
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             v 0.0 0.0 0.0\n\
             f 1 2 3\n\
             f 4 2 3\n",
        );

        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_vertex_list_bounded_by_face_references() {
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             v 1.0 1.0 0.0\n\
             f 1 2 3\n\
             f 2 4 3\n",
        );

        // Index list length == face-reference count, vertex list length ==
        // distinct structural vertices <= face references
        assert_eq!(data.index_count(), 6);
        assert_eq!(data.vertex_count(), 4);
        assert!(data.vertex_count() <= data.index_count());
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_missing_color_defaults_to_white() {
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             f 1 2 3\n",
        );

        for vertex in &data.vertices {
            assert_eq!(vertex.color, Vec3::ONE);
        }
    }

    #[test]
    fn test_embedded_vertex_colors_are_read() {
        let data = parse(
            "v 0.0 0.0 0.0 1.0 0.0 0.0\n\
             v 1.0 0.0 0.0 0.0 1.0 0.0\n\
             v 0.0 1.0 0.0 0.0 0.0 1.0\n\
             f 1 2 3\n",
        );

        assert_eq!(data.vertices[0].color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(data.vertices[1].color, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(data.vertices[2].color, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_normals_default_to_zero() {
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             f 1 2 3\n",
        );

        for vertex in &data.vertices {
            assert_eq!(vertex.normal, Vec3::ZERO);
        }
    }

    #[test]
    fn test_normals_are_resolved_per_corner() {
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             vn 0.0 0.0 1.0\n\
             f 1//1 2//1 3//1\n",
        );

        for vertex in &data.vertices {
            assert_eq!(vertex.normal, Vec3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_texcoord_v_is_flipped() {
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             vt 0.25 0.25\n\
             vt 0.50 1.00\n\
             vt 0.75 0.00\n\
             f 1/1 2/2 3/3\n",
        );

        assert_eq!(data.vertices[0].uv, Vec2::new(0.25, 0.75));
        assert_eq!(data.vertices[1].uv, Vec2::new(0.50, 0.00));
        assert_eq!(data.vertices[2].uv, Vec2::new(0.75, 1.00));
    }

    #[test]
    fn test_differing_uvs_keep_vertices_distinct() {
        // Same position, different uv: structurally different vertices
        // must not collapse
        let data = parse(
            "v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             vt 0.0 0.0\n\
             vt 1.0 1.0\n\
             f 1/1 2/1 3/1\n\
             f 1/2 2/1 3/1\n",
        );

        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.index_count(), 6);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        match load_obj_from(&mut "".as_bytes()) {
            Err(ResourceError::EmptyMesh) => {}
            other => panic!("expected EmptyMesh, got {:?}", other.map(|d| d.vertex_count())),
        }
    }

    #[test]
    fn test_missing_file_is_rejected() {
        match load_obj(Path::new("definitely/not/here.obj")) {
            Err(ResourceError::FileNotFound(_)) => {}
            other => panic!(
                "expected FileNotFound, got {:?}",
                other.map(|d| d.vertex_count())
            ),
        }
    }
}
