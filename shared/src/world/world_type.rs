use crate::{PeerId, PrefabId, TransformSnapshot};

/// Engine-side operations the SpawnManager needs. The engine owns the actual
/// objects & their transforms, the SpawnManager only tracks them by handle.
pub trait WorldMutType<E> {
    /// Creates a new engine object from a prefab
    fn instantiate(&mut self, prefab: PrefabId, transform: Option<&TransformSnapshot>) -> E;
    /// Destroys an engine object which has no custom InstanceHandler
    fn destroy(&mut self, world_entity: &E);
    fn has_entity(&self, world_entity: &E) -> bool;

    // Engine attachment
    fn attach(&mut self, child: &E, parent: &E);
    fn detach(&mut self, child: &E);
    /// The engine object `child` is currently attached to, if any
    fn engine_parent(&self, child: &E) -> Option<E>;
    fn transform(&self, world_entity: &E) -> Option<TransformSnapshot>;

    // Field replication
    fn apply_snapshot(&mut self, world_entity: &E, bytes: &[u8]);
    fn emit_snapshot(&self, world_entity: &E, peer: &PeerId) -> Vec<u8>;
}
