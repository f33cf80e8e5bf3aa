use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::resources::{Geometry, Material};
use crate::scene::Transform;

/// One node of a parsed model, referencing children by index.
#[derive(Debug, Clone)]
pub struct PrefabNode {
    pub name: String,
    pub transform: Transform,
    /// Indices into `Prefab::nodes`
    pub children_indices: Vec<usize>,
    pub mesh: Option<PrefabMesh>,
}

impl PrefabNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            children_indices: Vec::new(),
            mesh: None,
        }
    }
}

/// Mesh payload of a prefab node.
///
/// Geometry is the shared immutable resource; the material is a template
/// that `Scene::instantiate` clones for every instance, which keeps the
/// cached prefab pristine no matter how instances get restyled.
#[derive(Debug, Clone)]
pub struct PrefabMesh {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

impl PrefabMesh {
    #[must_use]
    pub fn morph_target_count(&self) -> usize {
        self.geometry.morph_target_count()
    }
}

/// Parsed model: flat node list plus its animation clips.
///
/// A prefab is plain shareable data with no scene handles in it. It is
/// cached by the asset server and turned into live nodes through
/// `Scene::instantiate`.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    pub name: String,
    /// All nodes, flattened; hierarchy is expressed through indices
    pub nodes: Vec<PrefabNode>,
    /// Indices of the top-level nodes
    pub root_indices: Vec<usize>,
    pub animations: Vec<Arc<AnimationClip>>,
}

impl Prefab {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty()
    }

    /// Largest shape key channel count over all meshes, zero when the
    /// model carries no shape keys at all.
    #[must_use]
    pub fn max_morph_target_count(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| node.mesh.as_ref())
            .map(PrefabMesh::morph_target_count)
            .max()
            .unwrap_or(0)
    }
}

/// Thread-safe shared reference to a cached prefab.
pub type SharedPrefab = Arc<Prefab>;
