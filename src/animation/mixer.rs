use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binding::TargetPath;
use crate::scene::Scene;

/// Owns and drives the actions bound to one instantiated subtree.
///
/// `update` advances time and applies; `apply` writes the current pose
/// without advancing, which is the path scrubbing takes every frame.
#[derive(Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    #[must_use]
    pub fn action_mut(&mut self, index: usize) -> Option<&mut AnimationAction> {
        self.actions.get_mut(index)
    }

    /// Names of the clips this mixer can play, in action order.
    #[must_use]
    pub fn list_animations(&self) -> Vec<&str> {
        self.actions
            .iter()
            .map(|a| a.clip().name.as_str())
            .collect()
    }

    /// Enables and unpauses the action whose clip matches `name`.
    /// Returns false when no such clip exists.
    pub fn play(&mut self, name: &str) -> bool {
        for action in &mut self.actions {
            if action.clip().name == name {
                action.enabled = true;
                action.paused = false;
                action.weight = 1.0;
                return true;
            }
        }
        false
    }

    /// Advances all actions by `dt`, then applies the sampled pose.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);
        }
        self.apply(scene);
    }

    /// Writes the pose at each action's current time into the scene.
    ///
    /// Paused actions are applied too: pausing freezes time, not the pose.
    pub fn apply(&mut self, scene: &mut Scene) {
        for action in &mut self.actions {
            if !action.enabled || action.weight <= 0.0 {
                continue;
            }
            apply_action(action, scene);
        }
    }
}

fn apply_action(action: &mut AnimationAction, scene: &mut Scene) {
    for i in 0..action.bindings.len() {
        let binding = action.bindings[i].clone();
        let Some(value) = action.sample_track(binding.track_index) else {
            continue;
        };

        match (value, binding.target) {
            (TrackValue::Vector3(v), TargetPath::Translation) => {
                if let Some(node) = scene.get_node_mut(binding.node_handle) {
                    node.transform.position = v;
                    node.transform.mark_dirty();
                }
            }
            (TrackValue::Vector3(v), TargetPath::Scale) => {
                if let Some(node) = scene.get_node_mut(binding.node_handle) {
                    node.transform.scale = v;
                    node.transform.mark_dirty();
                }
            }
            (TrackValue::Quaternion(q), TargetPath::Rotation) => {
                if let Some(node) = scene.get_node_mut(binding.node_handle) {
                    node.transform.rotation = q;
                    node.transform.mark_dirty();
                }
            }
            (TrackValue::MorphWeight(weights), TargetPath::Weights) => {
                let mesh_key = scene.get_node(binding.node_handle).and_then(|n| n.mesh);
                let target_count = mesh_key
                    .and_then(|key| scene.meshes.get(key))
                    .map(|mesh| mesh.morph_target_influences.len())
                    .unwrap_or(0);

                if target_count > 0
                    && let Some(node) = scene.get_node_mut(binding.node_handle)
                {
                    node.set_morph_weights(&weights.weights, target_count);
                }
            }
            _ => {}
        }
    }
}
