//! Hierarchy propagation pass, decoupled from `Scene` so it only borrows
//! the node pool and the root list.
//!
//! One walk refreshes both world matrices and effective visibility.
//! Matrices are recomputed only where a local transform or an ancestor
//! changed; visibility is a cheap AND down the parent chain and is
//! written unconditionally.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Work item: (node, parent world matrix, parent changed, parent visible).
type StackEntry = (NodeHandle, Affine3A, bool, bool);

/// Updates world matrices and visibility for every tree in `roots`.
///
/// Uses an explicit stack instead of recursion so deep hierarchies cannot
/// overflow the call stack.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false, true));
    }

    propagate(nodes, &mut stack);
}

/// Updates the subtree rooted at `root_handle`, seeding from the parent's
/// current world state. The root's matrix is refreshed unconditionally.
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root_handle: NodeHandle) {
    let Some(node) = nodes.get(root_handle) else {
        return;
    };

    let (parent_world, parent_visible) = match node.parent {
        Some(parent_handle) => nodes.get(parent_handle).map_or(
            (Affine3A::IDENTITY, true),
            |p| (p.transform.world_matrix, p.world_visible),
        ),
        None => (Affine3A::IDENTITY, true),
    };

    let mut stack: Vec<StackEntry> = vec![(root_handle, parent_world, true, parent_visible)];
    propagate(nodes, &mut stack);
}

fn propagate(nodes: &mut SlotMap<NodeHandle, Node>, stack: &mut Vec<StackEntry>) {
    while let Some((node_handle, parent_world_matrix, parent_changed, parent_visible)) = stack.pop()
    {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
        }

        node.world_visible = parent_visible && node.visible;

        let current_world = node.transform.world_matrix;
        let current_visible = node.world_visible;
        let children_count = node.children.len();

        // Push children in reverse to keep sibling processing order
        for i in (0..children_count).rev() {
            if let Some(node) = nodes.get(node_handle)
                && let Some(&child_handle) = node.children.get(i)
            {
                stack.push((child_handle, current_world, world_needs_update, current_visible));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_hierarchy_update() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();

        let mut parent = Node::new("parent");
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new("child");
        child.transform.position = Vec3::new(0.0, 1.0, 0.0);
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        let roots = vec![parent_handle];
        update_hierarchy(&mut nodes, &roots);

        let child_world_pos = nodes.get(child_handle).unwrap().transform.world_matrix.translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_visibility_masks_subtree() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();

        let mut parent = Node::new("parent");
        parent.visible = false;
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new("child");
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        let roots = vec![parent_handle];
        update_hierarchy(&mut nodes, &roots);

        assert!(!nodes.get(parent_handle).unwrap().world_visible);
        assert!(
            !nodes.get(child_handle).unwrap().world_visible,
            "child stays locally visible but must inherit the parent's mask"
        );
        assert!(nodes.get(child_handle).unwrap().visible);

        // Re-showing the parent restores the whole subtree
        nodes.get_mut(parent_handle).unwrap().visible = true;
        update_hierarchy(&mut nodes, &roots);
        assert!(nodes.get(child_handle).unwrap().world_visible);
    }
}
