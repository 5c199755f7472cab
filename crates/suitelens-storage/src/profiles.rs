use std::collections::BTreeMap;

use crate::StoreHandle;

/// Named session stores, immutable after construction.
///
/// Built once at startup through [`ProfileRegistry::builder`]; there is no
/// way to add or swap a profile afterwards, which keeps profile resolution
/// free of hidden mutable state.
pub struct ProfileRegistry {
    stores: BTreeMap<String, StoreHandle>,
}

impl ProfileRegistry {
    pub fn builder() -> ProfileRegistryBuilder {
        ProfileRegistryBuilder {
            stores: BTreeMap::new(),
        }
    }

    /// Resolve a profile name to its store.
    pub fn get(&self, name: &str) -> Option<StoreHandle> {
        self.stores.get(name).cloned()
    }

    /// Registered profile names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }
}

/// Builder for [`ProfileRegistry`].
pub struct ProfileRegistryBuilder {
    stores: BTreeMap<String, StoreHandle>,
}

impl ProfileRegistryBuilder {
    /// Register a store under a profile name; a repeated name replaces the
    /// earlier registration.
    pub fn with_profile(mut self, name: impl Into<String>, store: StoreHandle) -> Self {
        self.stores.insert(name.into(), store);
        self
    }

    pub fn build(self) -> ProfileRegistry {
        ProfileRegistry {
            stores: self.stores,
        }
    }
}
