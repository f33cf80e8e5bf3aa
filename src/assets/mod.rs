//! Asset IO, shared storage and the model loading pipeline.

pub mod io;
pub mod loaders;
pub mod prefab;
pub mod server;
pub mod storage;

pub use io::{AssetReaderVariant, FileAssetReader, Locator};
pub use prefab::{Prefab, PrefabMesh, PrefabNode, SharedPrefab};
pub use server::{AssetServer, GeometryHandle};
pub use storage::AssetStorage;

#[cfg(feature = "http")]
pub use io::HttpAssetReader;
