use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves a clip's tracks to concrete node handles within the subtree
    /// rooted at `root_node`. Tracks whose node name does not occur in the
    /// subtree are silently skipped.
    #[must_use]
    pub fn bind(
        scene: &Scene,
        root_node: NodeHandle,
        clip: &AnimationClip,
    ) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_idx, track) in clip.tracks.iter().enumerate() {
            let node_name = &track.meta.node_name;
            let target = track.meta.target;

            if let Some(node_handle) = scene.find_node_by_name(root_node, node_name) {
                bindings.push(PropertyBinding {
                    track_index: track_idx,
                    node_handle,
                    target,
                });
            } else {
                log::debug!("animation track target '{node_name}' not found in subtree");
            }
        }

        bindings
    }
}
