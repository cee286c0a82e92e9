use std::collections::HashMap;

use crate::TypeKey;

/// Engine-side handle of something that can be instantiated
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct PrefabId(u32);

impl PrefabId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// How a registered type key is resolved into a prefab
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefabOverride {
    /// Use the registered prefab itself
    None,
    /// Resolve through another type key instead
    Hash(TypeKey),
    /// Instantiate a different prefab
    Prefab(PrefabId),
}

#[derive(Clone, Copy, Debug)]
struct PrefabLink {
    prefab: PrefabId,
    prefab_override: PrefabOverride,
}

/// Maps the type keys carried in spawn messages to prefabs the engine knows
/// how to instantiate
pub struct PrefabCatalog {
    links: HashMap<TypeKey, PrefabLink>,
}

impl PrefabCatalog {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_key: TypeKey, prefab: PrefabId) {
        self.links.insert(
            type_key,
            PrefabLink {
                prefab,
                prefab_override: PrefabOverride::None,
            },
        );
    }

    pub fn register_override(
        &mut self,
        type_key: TypeKey,
        prefab: PrefabId,
        prefab_override: PrefabOverride,
    ) {
        self.links.insert(
            type_key,
            PrefabLink {
                prefab,
                prefab_override,
            },
        );
    }

    pub fn contains(&self, type_key: &TypeKey) -> bool {
        self.links.contains_key(type_key)
    }

    /// Follows override links until a prefab is found. Returns None for
    /// unknown keys and for override chains that loop.
    pub fn resolve(&self, type_key: &TypeKey) -> Option<PrefabId> {
        let mut key = *type_key;
        for _ in 0..=self.links.len() {
            let link = self.links.get(&key)?;
            match link.prefab_override {
                PrefabOverride::None => return Some(link.prefab),
                PrefabOverride::Prefab(prefab) => return Some(prefab),
                PrefabOverride::Hash(next_key) => key = next_key,
            }
        }
        None
    }
}

impl Default for PrefabCatalog {
    fn default() -> Self {
        Self::new()
    }
}
