//! Keyed registries of parsed worldgen objects.
//!
//! A [`Registry`] maps identifiers to parsed values of one type. Registries are
//! collected in a [`RegistryStore`], which hands them out both type-erased (as
//! [`DynamicRegistry`], for bulk replacement from raw documents) and typed (for
//! the generator to read).
//!
//! Replacing the contents of a registry goes through a [`RegistryBatch`]:
//! entries are parsed and staged one at a time, then swapped in with a single
//! write lock. Readers therefore see either the old contents or the new ones.

use crate::identifier::Identifier;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Errors raised by registry lookups and value parsing.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Entry {entry} not found in registry {registry}")]
    MissingEntry { registry: Identifier, entry: Identifier },
}

impl From<serde_json::Error> for RegistryError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidValue(error.to_string())
    }
}

/// A value that can be parsed from a raw data pack document.
pub trait RegistryValue: Sized + Send + Sync + 'static {
    fn parse(document: &Value) -> Result<Self, RegistryError>;
}

/// Deserialize a registry value straight from a JSON document.
pub fn deserialize_value<T: DeserializeOwned>(document: &Value) -> Result<T, RegistryError> {
    Ok(T::deserialize(document)?)
}

/// Insertion ordered map of parsed entries.
pub struct Registry<T> {
    key: Identifier,
    entries: RwLock<IndexMap<Identifier, Arc<T>>>,
}

impl<T: RegistryValue> Registry<T> {
    pub fn new(key: Identifier) -> Self {
        Self {
            key,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    #[inline]
    pub fn key(&self) -> &Identifier {
        &self.key
    }

    pub fn get(&self, id: &Identifier) -> Option<Arc<T>> {
        self.entries.read().get(id).cloned()
    }

    pub fn get_or_err(&self, id: &Identifier) -> Result<Arc<T>, RegistryError> {
        self.get(id).ok_or_else(|| RegistryError::MissingEntry {
            registry: self.key.clone(),
            entry: id.clone(),
        })
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Register a value, returning the one it replaced.
    pub fn register(&self, id: Identifier, value: T) -> Option<Arc<T>> {
        self.entries.write().insert(id, Arc::new(value))
    }

    pub fn keys(&self) -> Vec<Identifier> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("key", &self.key)
            .field("len", &self.entries.read().len())
            .finish()
    }
}

/// Type-erased view of a registry used for bulk replacement.
pub trait DynamicRegistry: Send + Sync {
    fn key(&self) -> &Identifier;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn keys(&self) -> Vec<Identifier>;

    /// Start replacing the registry contents. Nothing changes until the
    /// returned batch is committed.
    fn batch(&self) -> Box<dyn RegistryBatch + '_>;
}

/// Pending replacement of a registry's contents.
pub trait RegistryBatch {
    /// Parse `document` and stage it under `id`.
    fn register(&mut self, id: Identifier, document: &Value) -> Result<(), RegistryError>;

    /// Number of entries staged so far.
    fn staged(&self) -> usize;

    /// Swap the staged entries in, dropping everything the registry held
    /// before. Returns the new entry count.
    fn commit(self: Box<Self>) -> usize;
}

impl<T: RegistryValue> DynamicRegistry for Registry<T> {
    fn key(&self) -> &Identifier {
        &self.key
    }

    fn len(&self) -> usize {
        Registry::len(self)
    }

    fn keys(&self) -> Vec<Identifier> {
        Registry::keys(self)
    }

    fn batch(&self) -> Box<dyn RegistryBatch + '_> {
        Box::new(StagedBatch {
            registry: self,
            staged: IndexMap::new(),
        })
    }
}

struct StagedBatch<'a, T> {
    registry: &'a Registry<T>,
    staged: IndexMap<Identifier, Arc<T>>,
}

impl<T: RegistryValue> RegistryBatch for StagedBatch<'_, T> {
    fn register(&mut self, id: Identifier, document: &Value) -> Result<(), RegistryError> {
        let value = T::parse(document)?;
        self.staged.insert(id, Arc::new(value));
        Ok(())
    }

    fn staged(&self) -> usize {
        self.staged.len()
    }

    fn commit(self: Box<Self>) -> usize {
        let StagedBatch { registry, staged } = *self;
        let count = staged.len();
        *registry.entries.write() = staged;
        count
    }
}

struct StoredRegistry {
    erased: Arc<dyn DynamicRegistry>,
    typed: Arc<dyn Any + Send + Sync>,
}

/// The set of registries known to an engine instance.
///
/// Each store is independent, so tests and embedders can build as many
/// isolated instances as they need.
#[derive(Default)]
pub struct RegistryStore {
    registries: IndexMap<Identifier, StoredRegistry>,
}

impl RegistryStore {
    /// A store without any registries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a registry, replacing any registry with the same key.
    pub fn insert<T: RegistryValue>(&mut self, registry: Registry<T>) -> Arc<Registry<T>> {
        let registry = Arc::new(registry);
        let key = registry.key().clone();

        self.registries.insert(
            key,
            StoredRegistry {
                erased: Arc::clone(&registry) as Arc<dyn DynamicRegistry>,
                typed: Arc::clone(&registry) as Arc<dyn Any + Send + Sync>,
            },
        );

        registry
    }

    /// Typed access to a registry.
    ///
    /// Returns `None` if no registry with this key exists or if it holds a
    /// different value type.
    pub fn get<T: RegistryValue>(&self, key: &Identifier) -> Option<Arc<Registry<T>>> {
        let stored = self.registries.get(key)?;
        Arc::clone(&stored.typed).downcast::<Registry<T>>().ok()
    }

    /// Type-erased access to a registry.
    pub fn get_dyn(&self, key: &Identifier) -> Option<&Arc<dyn DynamicRegistry>> {
        self.registries.get(key).map(|stored| &stored.erased)
    }

    /// All registries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DynamicRegistry>> {
        self.registries.values().map(|stored| &stored.erased)
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

impl fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.registries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Height {
        value: i32,
    }

    impl RegistryValue for Height {
        fn parse(document: &Value) -> Result<Self, RegistryError> {
            deserialize_value(document)
        }
    }

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::<Height>::new(id("test/height"));
        assert!(registry.is_empty());

        registry.register(id("low"), Height { value: 1 });
        assert_eq!(registry.get(&id("low")).unwrap().value, 1);
        assert!(registry.get(&id("high")).is_none());
        assert!(matches!(
            registry.get_or_err(&id("high")),
            Err(RegistryError::MissingEntry { .. })
        ));
    }

    #[test]
    fn test_batch_replaces_on_commit() {
        let registry = Registry::<Height>::new(id("test/height"));
        registry.register(id("old"), Height { value: 0 });

        let mut batch = registry.batch();
        batch.register(id("new"), &json!({ "value": 5 })).unwrap();
        assert!(batch.register(id("broken"), &json!({ "value": "x" })).is_err());
        assert_eq!(batch.staged(), 1);

        // Nothing visible until commit.
        assert!(registry.contains(&id("old")));
        assert!(!registry.contains(&id("new")));

        assert_eq!(batch.commit(), 1);
        assert_eq!(registry.keys(), vec![id("new")]);
    }

    #[test]
    fn test_empty_batch_clears() {
        let registry = Registry::<Height>::new(id("test/height"));
        registry.register(id("old"), Height { value: 0 });

        assert_eq!(registry.batch().commit(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_store_typed_and_erased_access() {
        let mut store = RegistryStore::empty();
        let heights = store.insert(Registry::<Height>::new(id("test/height")));
        heights.register(id("a"), Height { value: 3 });

        let typed = store.get::<Height>(&id("test/height")).unwrap();
        assert_eq!(typed.get(&id("a")).unwrap().value, 3);

        let erased = store.get_dyn(&id("test/height")).unwrap();
        assert_eq!(erased.len(), 1);
        assert_eq!(store.iter().count(), 1);
        assert!(store.get::<Height>(&id("test/missing")).is_none());
    }
}
