use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use slotmap::{SecondaryMap, SlotMap};

use crate::animation::{AnimationAction, AnimationMixer, Binder};
use crate::assets::Prefab;
use crate::resources::{Material, Mesh};
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::{MaterialKey, MeshKey, NodeHandle};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Pure data scene graph: the node pool plus component maps.
///
/// Meshes and materials are pooled here rather than owned by nodes, so a
/// node stays small and component lookups are key-indexed. Animation
/// mixers are keyed by the instance root they were bound against.
pub struct Scene {
    pub id: u32,

    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Component pools ====
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub materials: SlotMap<MaterialKey, Material>,
    pub animation_mixers: SecondaryMap<NodeHandle, AnimationMixer>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),

            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            animation_mixers: SecondaryMap::new(),
        }
    }

    /// Starts building a node with the fluent [`NodeBuilder`] API.
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    /// Adds a node at the scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, child: Node, parent_handle: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);

        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent_handle);
        }

        handle
    }

    /// Removes a node and its whole subtree, releasing the meshes,
    /// materials and mixers owned by the removed nodes.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        // Take the children list first to avoid aliasing the pool
        let children = if let Some(node) = self.nodes.get(handle) {
            node.children.clone()
        } else {
            return;
        };

        for child in children {
            self.remove_node(child);
        }

        // Unlink from parent or from the root list
        let parent_opt = self.nodes.get(handle).and_then(|n| n.parent);

        if let Some(parent_handle) = parent_opt {
            if let Some(parent) = self.nodes.get_mut(parent_handle)
                && let Some(pos) = parent.children.iter().position(|&x| x == handle)
            {
                parent.children.remove(pos);
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(pos);
        }

        // Component cleanup
        if let Some(node) = self.nodes.get(handle)
            && let Some(mesh_key) = node.mesh
            && let Some(mesh) = self.meshes.remove(mesh_key)
        {
            self.materials.remove(mesh.material);
        }
        self.animation_mixers.remove(handle);

        self.nodes.remove(handle);
    }

    /// Re-parents `child_handle` under `parent_handle`, detaching it from
    /// its previous parent or the root list first.
    pub fn attach(&mut self, child_handle: NodeHandle, parent_handle: NodeHandle) {
        if child_handle == parent_handle {
            log::warn!("Cannot attach node to itself!");
            return;
        }

        // 1. Detach from old
        let old_parent = self.nodes.get(child_handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child_handle)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child_handle) {
            self.root_nodes.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(child_handle);
        } else {
            log::error!("Parent node not found during attach!");
            // Keep the child reachable rather than leaking it
            self.root_nodes.push(child_handle);
            return;
        }

        // 3. Update child
        if let Some(c) = self.nodes.get_mut(child_handle) {
            c.parent = Some(parent_handle);
            c.transform.mark_dirty();
        }
    }

    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Depth-first search for the first node named `name` in the subtree
    /// rooted at `root` (the root itself included).
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let node = self.nodes.get(root)?;
        if node.name == name {
            return Some(root);
        }
        for &child in &node.children {
            if let Some(found) = self.find_node_by_name(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// All handles in the subtree rooted at `root`, root first.
    #[must_use]
    pub fn subtree_nodes(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // ========================================================================
    // Matrix update pipeline
    // ========================================================================

    /// Refreshes world matrices and effective visibility for the whole
    /// scene. Must run once per frame after all transform writes.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &self.root_nodes);
    }

    /// Refreshes a single subtree without touching the rest of the graph.
    pub fn update_subtree(&mut self, root_handle: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root_handle);
    }

    // ========================================================================
    // Component management
    // ========================================================================

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_node(node)
    }

    pub fn add_mesh_to_parent(&mut self, mesh: Mesh, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_to_parent(node, parent)
    }

    /// Copies each node's animated morph weights onto its mesh so the
    /// render data matches what the mixers computed this frame.
    pub fn sync_morph_weights(&mut self) {
        let mut updates = Vec::new();

        for node in self.nodes.iter().map(|(_, n)| n) {
            if let Some(mesh_key) = node.mesh
                && !node.morph_weights.is_empty()
            {
                updates.push((mesh_key, node.morph_weights.clone()));
            }
        }

        for (mesh_key, weights) in updates {
            if let Some(mesh) = self.meshes.get_mut(mesh_key) {
                mesh.set_morph_target_influences(&weights);
            }
        }
    }

    // ========================================================================
    // Prefab instantiation
    // ========================================================================

    /// Clones a loaded prefab into the scene and returns the new instance
    /// root.
    ///
    /// Geometry is shared with the prefab via `Arc`; every mesh gets its
    /// own copy of the material template so instance styling never writes
    /// back into the cache. Animation clips are re-bound against the fresh
    /// node names and the resulting mixer is stored under the root.
    pub fn instantiate(&mut self, prefab: &Prefab) -> NodeHandle {
        let root_handle = self.add_node(Node::new(&prefab.name));

        for &index in &prefab.root_indices {
            self.instantiate_prefab_node(prefab, index, root_handle);
        }

        let mut mixer = AnimationMixer::new();
        for clip in &prefab.animations {
            let bindings = Binder::bind(self, root_handle, clip);
            if bindings.is_empty() {
                log::warn!(
                    "animation '{}' matched no nodes under prefab '{}'",
                    clip.name,
                    prefab.name
                );
                continue;
            }
            let mut action = AnimationAction::new(Arc::clone(clip));
            action.bindings = bindings;
            mixer.add_action(action);
        }
        if !mixer.is_empty() {
            self.animation_mixers.insert(root_handle, mixer);
        }

        root_handle
    }

    fn instantiate_prefab_node(
        &mut self,
        prefab: &Prefab,
        index: usize,
        parent_handle: NodeHandle,
    ) {
        let Some(prefab_node) = prefab.nodes.get(index) else {
            log::error!("prefab '{}' references missing node {index}", prefab.name);
            return;
        };

        let mut node = Node::new(&prefab_node.name);
        node.transform = prefab_node.transform.clone();

        if let Some(prefab_mesh) = &prefab_node.mesh {
            let material_key = self.materials.insert(prefab_mesh.material.clone());
            let mut mesh = Mesh::new(Arc::clone(&prefab_mesh.geometry), material_key);
            mesh.name.clone_from(&prefab_mesh.name);
            node.mesh = Some(self.meshes.insert(mesh));
        }

        let handle = self.add_to_parent(node, parent_handle);

        for &child_index in &prefab_node.children_indices {
            self.instantiate_prefab_node(prefab, child_index, handle);
        }
    }
}

pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeHandle>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            node: Node::new(name),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = glam::Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = glam::Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.node.visible = visible;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshKey) -> Self {
        self.node.mesh = Some(mesh);
        self
    }

    /// Inserts the node into the scene and returns its handle.
    pub fn build(self) -> NodeHandle {
        let node_handle = self.scene.nodes.insert(self.node);

        if let Some(parent_handle) = self.parent {
            self.scene.attach(node_handle, parent_handle);
        } else {
            self.scene.root_nodes.push(node_handle);
        }

        node_handle
    }
}
