use std::collections::HashMap;

use crate::{PeerId, TransformSnapshot, TypeKey};

/// Custom construction & destruction for entities of one type key, used in
/// place of generic prefab instantiation (pooling, for example)
pub trait InstanceHandler<E>: Send + Sync {
    fn instantiate(&mut self, owner: Option<PeerId>, transform: Option<&TransformSnapshot>) -> E;
    fn destroy(&mut self, world_entity: &E);
}

/// Lookup table from type key to its registered InstanceHandler
pub struct InstanceHandlers<E> {
    handlers: HashMap<TypeKey, Box<dyn InstanceHandler<E>>>,
}

impl<E> InstanceHandlers<E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler, returning the one it replaced
    pub fn register(
        &mut self,
        type_key: TypeKey,
        handler: Box<dyn InstanceHandler<E>>,
    ) -> Option<Box<dyn InstanceHandler<E>>> {
        self.handlers.insert(type_key, handler)
    }

    pub fn unregister(&mut self, type_key: &TypeKey) -> Option<Box<dyn InstanceHandler<E>>> {
        self.handlers.remove(type_key)
    }

    pub fn has_handler(&self, type_key: &TypeKey) -> bool {
        self.handlers.contains_key(type_key)
    }

    pub fn instantiate(
        &mut self,
        type_key: &TypeKey,
        owner: Option<PeerId>,
        transform: Option<&TransformSnapshot>,
    ) -> Option<E> {
        self.handlers
            .get_mut(type_key)
            .map(|handler| handler.instantiate(owner, transform))
    }

    /// Returns false if no handler is registered for the type key
    pub fn destroy(&mut self, type_key: &TypeKey, world_entity: &E) -> bool {
        match self.handlers.get_mut(type_key) {
            Some(handler) => {
                handler.destroy(world_entity);
                true
            }
            None => false,
        }
    }
}

impl<E> Default for InstanceHandlers<E> {
    fn default() -> Self {
        Self::new()
    }
}
