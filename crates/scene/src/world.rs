//! Scene objects and the world that owns them.
//!
//! Objects carry a stable integer id issued by the owning [`World`]'s
//! incrementing counter. Ids are never reused, so externally held
//! id-to-object maps can't silently alias a new object after a despawn.
//! The counter is per-world state, not a global: tests construct isolated
//! worlds with their own counters.

use std::collections::BTreeMap;

use crate::arena::MeshHandle;
use crate::light::PointLight;
use crate::transform::Transform;

/// Stable identity of a scene object.
///
/// Unique for the lifetime of the object within its world; never issued
/// twice by the same world (unless the world is explicitly reset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Raw id value, for logging and debugging.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// What a scene object is.
///
/// A tagged variant rather than a trait object: render systems match on
/// the tag to decide behavior.
#[derive(Clone, Copy, Debug)]
pub enum ObjectKind {
    /// An object drawing a shared GPU mesh.
    Mesh(MeshHandle),
    /// A point light billboard.
    PointLight(PointLight),
}

/// A scene object: stable id, transform, and a tagged kind.
#[derive(Clone, Debug)]
pub struct SceneObject {
    id: ObjectId,
    /// World transform of the object.
    pub transform: Transform,
    /// What the object is.
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Returns the object's stable id.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the mesh handle if this object draws a mesh.
    pub fn mesh_handle(&self) -> Option<MeshHandle> {
        match self.kind {
            ObjectKind::Mesh(handle) => Some(handle),
            ObjectKind::PointLight(_) => None,
        }
    }

    /// Returns the point light if this object is one.
    pub fn point_light(&self) -> Option<&PointLight> {
        match &self.kind {
            ObjectKind::PointLight(light) => Some(light),
            ObjectKind::Mesh(_) => None,
        }
    }
}

/// The world: all scene objects plus the id counter that names them.
///
/// Iteration order is id order (creation order), which keeps render
/// traversal deterministic.
#[derive(Debug, Default)]
pub struct World {
    next_id: u32,
    objects: BTreeMap<ObjectId, SceneObject>,
}

impl World {
    /// Create an empty world with a fresh id counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an object drawing the given shared mesh.
    pub fn spawn_mesh(&mut self, handle: MeshHandle) -> ObjectId {
        self.spawn(ObjectKind::Mesh(handle))
    }

    /// Spawns a point light.
    pub fn spawn_point_light(&mut self, light: PointLight) -> ObjectId {
        self.spawn(ObjectKind::PointLight(light))
    }

    /// Spawns an object of the given kind with a default transform.
    pub fn spawn(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        self.objects.insert(
            id,
            SceneObject {
                id,
                transform: Transform::default(),
                kind,
            },
        );

        id
    }

    /// Removes an object from the world, returning it.
    ///
    /// The id is retired: it will never be issued again by this world.
    pub fn despawn(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(&id)
    }

    /// Returns a reference to an object.
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Returns a mutable reference to an object.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Iterates the objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Iterates the objects mutably in id order.
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.values_mut()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the world has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Clears all objects and restarts the id counter.
    ///
    /// Only intended for tear-down or between test cases; ids issued after
    /// a reset start from zero again.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_ids_are_monotonic() {
        let mut world = World::new();
        let a = world.spawn_point_light(PointLight::default());
        let b = world.spawn_point_light(PointLight::default());
        let c = world.spawn_point_light(PointLight::default());

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_ids_are_never_reused_after_despawn() {
        let mut world = World::new();
        let a = world.spawn_point_light(PointLight::default());
        world.despawn(a);

        let b = world.spawn_point_light(PointLight::default());
        assert_ne!(a, b);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());
    }

    #[test]
    fn test_isolated_worlds_have_independent_counters() {
        let mut first = World::new();
        let mut second = World::new();

        let a = first.spawn_point_light(PointLight::default());
        let b = second.spawn_point_light(PointLight::default());

        // Both worlds start counting from zero independently
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 0);
    }

    #[test]
    fn test_reset_restarts_counter() {
        let mut world = World::new();
        world.spawn_point_light(PointLight::default());
        world.spawn_point_light(PointLight::default());

        world.reset();
        assert!(world.is_empty());

        let id = world.spawn_point_light(PointLight::default());
        assert_eq!(id.raw(), 0);
    }

    #[test]
    fn test_objects_iterate_in_creation_order() {
        let mut world = World::new();
        let a = world.spawn_point_light(PointLight::default());
        let b = world.spawn_point_light(PointLight::default());
        world.despawn(a);
        let c = world.spawn_point_light(PointLight::default());

        let ids: Vec<ObjectId> = world.objects().map(|o| o.id()).collect();
        assert_eq!(ids, vec![b, c]);
    }

    #[test]
    fn test_kind_accessors() {
        let mut world = World::new();
        let light_id = world.spawn_point_light(PointLight::with_intensity(2.0));

        let object = world.get(light_id).unwrap();
        assert!(object.mesh_handle().is_none());
        assert_eq!(object.point_light().unwrap().intensity, 2.0);
    }

    #[test]
    fn test_transform_is_mutable_through_world() {
        let mut world = World::new();
        let id = world.spawn_point_light(PointLight::default());

        world.get_mut(id).unwrap().transform.translation = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            world.get(id).unwrap().transform.translation,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }
}
