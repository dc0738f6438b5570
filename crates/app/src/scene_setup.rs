//! Demo scene population.

use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::info;

use lantern_renderer::{MeshArena, Renderer};
use lantern_resources::PixelData;
use lantern_rhi::image::Texture;
use lantern_rhi::mesh::Mesh;
use lantern_scene::{Camera, PointLight, World};

/// The loaded demo scene: world, shared mesh arena, and the one texture
/// bound into the per-frame binding tables.
pub struct Scene {
    pub world: World,
    pub arena: MeshArena,
    pub camera: Camera,
    /// Keeps the sampled texture alive for the renderer's lifetime.
    _texture: Texture,
}

/// Light colors for the orbiting ring.
const LIGHT_COLORS: [Vec3; 6] = [
    Vec3::new(1.0, 0.1, 0.1),
    Vec3::new(0.1, 0.1, 1.0),
    Vec3::new(0.1, 1.0, 0.1),
    Vec3::new(1.0, 1.0, 0.1),
    Vec3::new(0.1, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

/// Loads the demo meshes, creates the checkerboard texture, and populates
/// the world.
pub fn load_scene(renderer: &Renderer) -> Result<Scene> {
    let mut world = World::new();
    let mut arena = MeshArena::new();

    // Floor
    let quad_data = lantern_resources::load_obj(Path::new("models/quad.obj"))
        .context("loading models/quad.obj")?;
    let quad = arena.insert(Mesh::new(renderer.uploader(), &quad_data)?);

    let floor = world.spawn_mesh(quad);
    {
        let object = world.get_mut(floor).unwrap();
        object.transform.translation = Vec3::new(0.0, 0.0, 0.0);
        object.transform.scale = Vec3::new(3.0, 1.0, 3.0);
    }

    // Two cubes sharing one GPU mesh through the arena
    let cube_data = lantern_resources::load_obj(Path::new("models/cube.obj"))
        .context("loading models/cube.obj")?;
    let cube = arena.insert(Mesh::new(renderer.uploader(), &cube_data)?);

    for (x, scale) in [(-0.8, 0.5), (0.8, 0.35)] {
        let id = world.spawn_mesh(cube);
        let object = world.get_mut(id).unwrap();
        object.transform.translation = Vec3::new(x, scale, 0.0);
        object.transform.scale = Vec3::splat(scale);
    }

    // Ring of colored point lights; the system rotates them every frame
    for (i, color) in LIGHT_COLORS.iter().enumerate() {
        let angle = i as f32 * std::f32::consts::TAU / LIGHT_COLORS.len() as f32;
        let id = world.spawn_point_light(PointLight {
            color: *color,
            intensity: 0.6,
            radius: 0.08,
        });
        world.get_mut(id).unwrap().transform.translation =
            Vec3::new(1.6 * angle.cos(), 1.2, 1.6 * angle.sin());
    }

    // Diffuse texture sampled by the mesh shader: an image file when one
    // is shipped, a procedural checkerboard otherwise
    let pixels = match lantern_resources::load_pixels(Path::new("textures/checker.png")) {
        Ok(pixels) => pixels,
        Err(_) => checkerboard_pixels()?,
    };
    let texture = Texture::from_pixels(
        renderer.device().clone(),
        renderer.uploader(),
        pixels.width,
        pixels.height,
        &pixels.pixels,
    )?;
    renderer.frame_uniforms().set_texture(&texture);

    let mut camera = Camera::new();
    camera.set_view_yxz(Vec3::new(0.0, 1.4, 3.2), Vec3::new(-0.35, 0.0, 0.0));

    info!(
        "Scene loaded: {} objects, {} meshes",
        world.len(),
        arena.len()
    );

    Ok(Scene {
        world,
        arena,
        camera,
        _texture: texture,
    })
}

/// Builds an 8x8 two-tone checkerboard pixel buffer.
fn checkerboard_pixels() -> Result<PixelData> {
    const SIZE: u32 = 8;
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);

    for y in 0..SIZE {
        for x in 0..SIZE {
            let light = (x + y) % 2 == 0;
            let value = if light { 255 } else { 180 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }

    Ok(PixelData::from_rgba8(SIZE, SIZE, pixels)?)
}
