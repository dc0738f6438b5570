//! Scene management.
//!
//! This crate provides the CPU-side scene model:
//! - Transform (translation, rotation, scale)
//! - Camera matrices
//! - Light definitions
//! - The world: scene objects with stable ids, and the handle arena that
//!   shares GPU meshes between objects

pub mod arena;
pub mod camera;
pub mod light;
pub mod transform;
pub mod world;

pub use arena::{HandleArena, MeshHandle};
pub use camera::Camera;
pub use light::PointLight;
pub use transform::Transform;
pub use world::{ObjectId, ObjectKind, SceneObject, World};
