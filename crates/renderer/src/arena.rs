//! GPU mesh arena.
//!
//! Scene objects share meshes by handle; the arena is the single owner of
//! the GPU resources. See [`lantern_scene::HandleArena`] for the container
//! semantics (monotonic handles, no reuse).

use lantern_rhi::mesh::Mesh;
use lantern_scene::HandleArena;

/// Arena of GPU meshes shared between scene objects.
///
/// Entries must only be removed or cleared after the device is idle; the
/// [`crate::Renderer`] tear-down sequence guarantees this by waiting for
/// the GPU before the arena drops.
pub type MeshArena = HandleArena<Mesh>;
