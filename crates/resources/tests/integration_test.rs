//! Integration tests for OBJ loading against the shipped demo models.

use std::path::Path;

use lantern_resources::load_obj;

#[test]
fn test_load_cube_model() {
    let model_path = Path::new("../../models/cube.obj");

    // Skip if the repo's demo assets aren't present
    if !model_path.exists() {
        println!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let data = load_obj(model_path).expect("Failed to load cube.obj");

    // 6 faces * 2 triangles * 3 corners
    assert_eq!(data.index_count(), 36);

    // Each face has its own normal, so corners shared between faces stay
    // distinct: 6 faces * 4 corners
    assert_eq!(data.vertex_count(), 24);

    assert!(data.validate().is_ok());

    // No source color channel: everything defaults to opaque white
    for vertex in &data.vertices {
        assert_eq!(vertex.color, glam::Vec3::ONE);
    }
}

#[test]
fn test_load_quad_model() {
    let model_path = Path::new("../../models/quad.obj");

    if !model_path.exists() {
        println!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let data = load_obj(model_path).expect("Failed to load quad.obj");

    // Two triangles sharing an edge: 4 unique vertices, 6 indices
    assert_eq!(data.vertex_count(), 4);
    assert_eq!(data.index_count(), 6);
    assert!(data.validate().is_ok());
}
