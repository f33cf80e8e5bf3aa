use glam::Affine3A;
use smallvec::SmallVec;

use crate::scene::transform::Transform;
use crate::scene::{MeshKey, NodeHandle};

/// A minimal scene node containing only essential hot data.
///
/// # Design Principles
///
/// - Only keeps data that must be traversed every frame (hierarchy,
///   transform, visibility and the animated morph weights)
/// - Heavier attributes (mesh data, materials) live in the `Scene`
///   component maps and are referenced by key
///
/// # Hierarchy
///
/// Nodes form a tree structure through parent-child relationships:
/// - `parent`: Optional handle to parent node (None for root nodes)
/// - `children`: List of child node handles
///
/// # Transform
///
/// Each node has a [`Transform`] component that manages:
/// - Local position, rotation, and scale
/// - Cached local and world matrices
/// - Dirty flag for efficient updates
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Core Hierarchy ===
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    /// Transform component (hot data accessed every frame)
    pub transform: Transform,

    // === Core State ===
    /// Local visibility flag
    pub visible: bool,
    /// Effective visibility, refreshed by the transform pass from the
    /// parent chain. A node renders only when this is true.
    pub world_visible: bool,

    // === Components ===
    /// Mesh attached to this node, if any
    pub mesh: Option<MeshKey>,
    /// Animated shape key weights, mirrored onto the mesh each frame
    pub morph_weights: SmallVec<[f32; 8]>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            world_visible: true,
            mesh: None,
            morph_weights: SmallVec::new(),
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Sets the parent of this node. Prefer using [`Scene::attach`] which
    /// keeps both parent and child in sync. This is exposed for low-level
    /// construction (e.g., building hierarchies outside of a `Scene`).
    ///
    /// [`Scene::attach`]: crate::scene::Scene::attach
    #[inline]
    pub fn set_parent(&mut self, parent: Option<NodeHandle>) {
        self.parent = parent;
    }

    /// Appends a child handle. Prefer using [`Scene::attach`] which keeps
    /// both parent and child in sync.
    ///
    /// [`Scene::attach`]: crate::scene::Scene::attach
    #[inline]
    pub fn push_child(&mut self, child: NodeHandle) {
        self.children.push(child);
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// This matrix transforms local coordinates to world coordinates.
    /// It is refreshed by the transform pass each frame.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    /// Overwrites the animated morph weights, sized to `target_count`.
    ///
    /// Extra incoming values are dropped and missing ones pad with zero,
    /// so the stored weights always match the mesh's channel count.
    pub fn set_morph_weights(&mut self, weights: &[f32], target_count: usize) {
        self.morph_weights.clear();
        self.morph_weights.resize(target_count, 0.0);
        let n = target_count.min(weights.len());
        self.morph_weights[..n].copy_from_slice(&weights[..n]);
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
