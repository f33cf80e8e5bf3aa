use crate::scene::NodeHandle;

/// Which animated property of a node a track writes to.
///
/// The four paths mirror the glTF channel targets; `Weights` drives the
/// morph influences of the node's mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

/// Resolved link from clip track `track_index` to the scene node it
/// animates. Produced per instance by [`crate::animation::Binder`].
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}
