//! Scene graph: a flat node pool with parent/child links plus component
//! maps for meshes, materials and animation mixers.

mod node;
#[allow(clippy::module_inception)]
mod scene;
mod transform;
mod transform_system;

pub use node::Node;
pub use scene::{NodeBuilder, Scene};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct MaterialKey;
}
