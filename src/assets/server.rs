use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::new_key_type;
use tokio::runtime::Runtime;

use crate::assets::io::Locator;
use crate::assets::prefab::SharedPrefab;
use crate::assets::storage::AssetStorage;
use crate::errors::Result;
use crate::resources::Geometry;

/// Dedicated runtime for asset IO so loads never depend on the caller
/// running inside tokio.
pub(crate) fn asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
}

/// Shared entry point for model loading.
///
/// Cloning is cheap; all clones see the same geometry storage and the same
/// prefab cache. Loaded prefabs are immutable templates, so handing the
/// same `Arc` to several consumers is safe.
#[derive(Clone)]
pub struct AssetServer {
    pub geometries: Arc<AssetStorage<GeometryHandle, Geometry>>,
    prefabs: Arc<Mutex<FxHashMap<String, SharedPrefab>>>,
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            geometries: Arc::new(AssetStorage::new()),
            prefabs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Blocking wrapper around [`Self::load_model_async`].
    pub fn load_model(&self, locator: &Locator) -> Result<SharedPrefab> {
        asset_runtime().block_on(self.load_model_async(locator))
    }

    /// Loads the model behind `locator`, or returns the cached template.
    ///
    /// Two concurrent loads of the same source may both parse, but geometry
    /// dedup keeps the stored vertex data single-copy and the cache settles
    /// on one of the two results.
    pub async fn load_model_async(&self, locator: &Locator) -> Result<SharedPrefab> {
        let cache_key = locator.cache_key();

        if let Some(prefab) = self.prefabs.lock().get(&cache_key) {
            return Ok(Arc::clone(prefab));
        }

        #[cfg(feature = "gltf")]
        {
            let prefab =
                crate::assets::loaders::gltf::load_prefab(locator, &self.geometries).await?;
            let prefab: SharedPrefab = Arc::new(prefab);
            self.prefabs.lock().insert(cache_key, Arc::clone(&prefab));
            Ok(prefab)
        }

        #[cfg(not(feature = "gltf"))]
        {
            Err(crate::errors::ReviewError::FeatureNotEnabled(format!(
                "loading '{locator}' requires the 'gltf' feature"
            )))
        }
    }

    /// Cache lookup without triggering a load.
    #[must_use]
    pub fn cached_model(&self, locator: &Locator) -> Option<SharedPrefab> {
        self.prefabs.lock().get(&locator.cache_key()).cloned()
    }
}
