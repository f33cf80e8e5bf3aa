use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slotmap::{Key, SlotMap};
use std::sync::Arc;
use uuid::Uuid;

struct StorageInner<H: Key, T> {
    map: SlotMap<H, Arc<T>>,
    lookup: FxHashMap<Uuid, H>,
}

impl<H: Key, T> Default for StorageInner<H, T> {
    fn default() -> Self {
        Self {
            map: SlotMap::default(),
            lookup: FxHashMap::default(),
        }
    }
}

/// Thread-safe keyed store for assets shared between loads.
///
/// Loaded resources are immutable and handed out as `Arc<T>`, so readers
/// never hold the lock longer than the map lookup. The UUID lookup table
/// deduplicates loads of the same content arriving through different
/// requests.
pub struct AssetStorage<H: Key, T> {
    inner: RwLock<StorageInner<H, T>>,
}

impl<H: Key, T> Default for AssetStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> AssetStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::default(),
        }
    }

    /// Adds an anonymous resource and returns its handle.
    pub fn add(&self, asset: impl Into<T>) -> H {
        let mut guard = self.inner.write();
        guard.map.insert(Arc::new(asset.into()))
    }

    /// Adds a resource under a dedup UUID. If the UUID is already present
    /// the existing handle comes back and `asset` is dropped.
    pub fn add_with_uuid(&self, uuid: Uuid, asset: impl Into<T>) -> H {
        let mut guard = self.inner.write();
        if let Some(&handle) = guard.lookup.get(&uuid) {
            return handle;
        }
        let handle = guard.map.insert(Arc::new(asset.into()));
        guard.lookup.insert(uuid, handle);
        handle
    }

    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        let guard = self.inner.read();
        guard.map.get(handle).cloned()
    }

    pub fn get_by_uuid(&self, uuid: &Uuid) -> Option<Arc<T>> {
        let guard = self.inner.read();
        let handle = guard.lookup.get(uuid)?;
        guard.map.get(*handle).cloned()
    }

    pub fn get_handle_by_uuid(&self, uuid: &Uuid) -> Option<H> {
        let guard = self.inner.read();
        guard.lookup.get(uuid).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::new_key_type;

    new_key_type! {
        struct TestKey;
    }

    #[test]
    fn add_with_uuid_deduplicates() {
        let storage: AssetStorage<TestKey, String> = AssetStorage::new();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"model-a");

        let first = storage.add_with_uuid(id, "payload".to_string());
        let second = storage.add_with_uuid(id, "ignored".to_string());

        assert_eq!(first, second);
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(first).unwrap().as_str(), "payload");
    }

    #[test]
    fn anonymous_adds_stay_distinct() {
        let storage: AssetStorage<TestKey, String> = AssetStorage::new();
        let a = storage.add("one".to_string());
        let b = storage.add("one".to_string());
        assert_ne!(a, b);
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn get_by_uuid_resolves_after_dedup() {
        let storage: AssetStorage<TestKey, String> = AssetStorage::new();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"shared");
        let handle = storage.add_with_uuid(id, "data".to_string());

        assert_eq!(storage.get_handle_by_uuid(&id), Some(handle));
        assert_eq!(storage.get_by_uuid(&id).unwrap().as_str(), "data");
        assert!(storage.get_by_uuid(&Uuid::new_v4()).is_none());
    }
}
