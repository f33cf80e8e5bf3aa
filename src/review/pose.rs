//! Mapping a timeline position onto the runtime pose of one model.
//!
//! The drive mode is decided once, right after instantiation, and stays
//! fixed for the lifetime of the instance. Evaluation is a pure function
//! of the position: calling it twice with the same value lands on the
//! same clip time and the same shape key influences.

use smallvec::SmallVec;

use crate::scene::{NodeHandle, Scene};

/// Repairs a raw scrub value: non-finite becomes 0, everything else is
/// clamped into [0, 1]. Corrupt input never reaches the pose.
#[must_use]
pub fn normalized(progress: f32) -> f32 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Continuous position across the usable shape key frames for `progress`.
/// `frames_count` excludes the base channel.
#[must_use]
pub fn virtual_frame(progress: f32, frames_count: usize) -> f32 {
    if frames_count == 0 {
        return 0.0;
    }
    normalized(progress) * (frames_count as f32 - 1.0)
}

/// How an instantiated model is posed during review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseDriver {
    /// A keyframe clip scrubbed by absolute local time.
    Clip { duration: f32 },
    /// Discrete shape keys blended pairwise. Channel 0 holds the neutral
    /// base shape; channels 1.. are successive animation frames.
    ShapeKeys,
    /// Nothing to animate; the model stays at its base pose.
    Static,
}

impl PoseDriver {
    /// Inspects an instantiated subtree once and picks the drive mode.
    ///
    /// An authored clip wins over raw shape keys. With fewer than two
    /// shape key channels there is nothing to blend, which is not an
    /// error: the model simply renders static.
    #[must_use]
    pub fn detect(scene: &Scene, root: NodeHandle) -> Self {
        if let Some(mixer) = scene.animation_mixers.get(root)
            && !mixer.is_empty()
        {
            let duration = mixer
                .actions()
                .first()
                .map_or(0.0, |action| action.clip().duration);
            return Self::Clip { duration };
        }

        let max_channels = scene
            .subtree_nodes(root)
            .into_iter()
            .filter_map(|handle| scene.get_node(handle).and_then(|n| n.mesh))
            .filter_map(|mesh_key| scene.meshes.get(mesh_key))
            .map(|mesh| mesh.morph_target_influences.len())
            .max()
            .unwrap_or(0);

        if max_channels >= 2 {
            return Self::ShapeKeys;
        }

        Self::Static
    }

    /// Writes the pose for `progress` into the subtree under `root`.
    pub fn evaluate(self, scene: &mut Scene, root: NodeHandle, progress: f32) {
        let progress = normalized(progress);

        match self {
            Self::Clip { .. } => evaluate_clip(scene, root, progress),
            Self::ShapeKeys => evaluate_shape_keys(scene, root, progress),
            Self::Static => {}
        }
    }
}

/// Pins the first clip to `duration * progress` and applies it.
///
/// The action stays paused the whole time; scrubbing drives its local
/// time directly instead of letting the mixer advance it. Additional
/// clips beyond the first are disabled.
fn evaluate_clip(scene: &mut Scene, root: NodeHandle, progress: f32) {
    let Some(mut mixer) = scene.animation_mixers.remove(root) else {
        return;
    };

    for index in 0..mixer.actions().len() {
        if let Some(action) = mixer.action_mut(index) {
            if index == 0 {
                action.enabled = true;
                action.paused = true;
                action.set_normalized_time(progress);
            } else {
                action.enabled = false;
            }
        }
    }
    mixer.apply(scene);

    scene.animation_mixers.insert(root, mixer);
}

/// Blends between the two shape key frames adjacent to `progress`.
///
/// With `count` channels, frames 1..count-1 are playable and channel 0 is
/// skipped. The continuous `virtual_frame` selects a lower frame at weight
/// `1 - alpha` and its successor at `alpha`; at either end of the range
/// this collapses to a single frame at full weight. A mesh with exactly
/// two channels always shows frame 1, there is nothing to blend toward.
fn evaluate_shape_keys(scene: &mut Scene, root: NodeHandle, progress: f32) {
    for handle in scene.subtree_nodes(root) {
        let Some(mesh_key) = scene.get_node(handle).and_then(|n| n.mesh) else {
            continue;
        };
        let count = scene
            .meshes
            .get(mesh_key)
            .map_or(0, |mesh| mesh.morph_target_influences.len());
        if count < 2 {
            continue;
        }

        let frames_count = count - 1;
        let frame = virtual_frame(progress, frames_count);
        let lower = frame.floor() as usize + 1;
        let upper = lower + 1;
        let alpha = frame.fract();

        let mut influences: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, count);
        if lower < count {
            influences[lower] = 1.0 - alpha;
        }
        if upper < count {
            influences[upper] = alpha;
        }

        if let Some(node) = scene.get_node_mut(handle) {
            node.set_morph_weights(&influences, count);
        }
    }
}
