//! Pose Evaluator Tests
//!
//! Tests for:
//! - shape key influence blending (sum-to-one, adjacent pairs, bounds)
//! - degenerate two-channel meshes
//! - idempotence and monotonicity of evaluation
//! - drive mode detection (clip vs shape keys vs static)
//! - clip scrubbing via pinned action time

use std::sync::Arc;

use glam::Vec3;

use organoid_review::animation::{
    AnimationAction, AnimationClip, AnimationMixer, InterpolationMode, KeyframeTrack,
    MorphWeightData, PropertyBinding, TargetPath, Track, TrackData, TrackMeta,
};
use organoid_review::resources::{Geometry, Material, Mesh};
use organoid_review::review::{PoseDriver, normalized, virtual_frame};
use organoid_review::scene::{MeshKey, NodeHandle, Scene};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Scene with a single root holding one mesh that has `channels` shape key
/// channels (channel 0 being the base shape).
fn morph_scene(channels: usize) -> (Scene, NodeHandle, MeshKey) {
    let mut scene = Scene::new();
    let root = scene.build_node("model_root").build();

    let mut geometry = Geometry::new();
    geometry.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    geometry.indices = vec![0, 1, 2];
    for k in 0..channels {
        geometry.morph_positions
            .push(vec![Vec3::new(0.0, 0.0, k as f32 + 1.0); 3]);
    }

    let material = scene.add_material(Material::default());
    let mesh_node = scene.add_mesh_to_parent(Mesh::new(Arc::new(geometry), material), root);
    let mesh_key = scene.get_node(mesh_node).and_then(|n| n.mesh).unwrap();

    (scene, root, mesh_key)
}

fn influences(scene: &Scene, mesh_key: MeshKey) -> Vec<f32> {
    scene.meshes[mesh_key].morph_target_influences.clone()
}

/// Runs one evaluation pass the way a frame would: pose, then sync.
fn evaluate_at(scene: &mut Scene, root: NodeHandle, progress: f32) {
    PoseDriver::detect(scene, root).evaluate(scene, root, progress);
    scene.sync_morph_weights();
}

// ============================================================================
// Shape key blending
// ============================================================================

#[test]
fn influences_sum_to_one_across_the_range() {
    let (mut scene, root, mesh_key) = morph_scene(6);

    for i in 0..=100 {
        let progress = i as f32 / 100.0;
        evaluate_at(&mut scene, root, progress);

        let weights = influences(&scene, mesh_key);
        let sum: f32 = weights.iter().sum();
        assert!(
            approx(sum, 1.0),
            "sum(influences) should be 1 at progress {progress}, got {sum}"
        );

        let non_zero = weights.iter().filter(|w| **w > 0.0).count();
        assert!(
            non_zero == 1 || non_zero == 2,
            "expected one or two active channels at progress {progress}, got {non_zero}"
        );
    }
}

#[test]
fn base_channel_stays_at_zero() {
    let (mut scene, root, mesh_key) = morph_scene(5);

    for i in 0..=20 {
        evaluate_at(&mut scene, root, i as f32 / 20.0);
        assert!(
            approx(influences(&scene, mesh_key)[0], 0.0),
            "channel 0 is the base shape and never animates"
        );
    }
}

#[test]
fn progress_zero_selects_first_frame() {
    let (mut scene, root, mesh_key) = morph_scene(5);
    evaluate_at(&mut scene, root, 0.0);

    let weights = influences(&scene, mesh_key);
    assert!(approx(weights[1], 1.0), "frame 1 at full weight, got {weights:?}");
    assert!(weights[2..].iter().all(|w| approx(*w, 0.0)));
}

#[test]
fn progress_one_selects_last_frame() {
    let (mut scene, root, mesh_key) = morph_scene(5);
    evaluate_at(&mut scene, root, 1.0);

    let weights = influences(&scene, mesh_key);
    assert!(
        approx(weights[4], 1.0),
        "the final frame takes full weight at the end, got {weights:?}"
    );
    assert!(approx(weights.iter().sum::<f32>(), 1.0));
}

#[test]
fn interior_progress_blends_adjacent_frames() {
    // 5 channels -> 4 usable frames -> virtual range [0, 3]
    let (mut scene, root, mesh_key) = morph_scene(5);
    evaluate_at(&mut scene, root, 0.5);

    let weights = influences(&scene, mesh_key);
    // virtualFrame = 1.5: halfway between frames 2 and 3
    assert!(approx(weights[2], 0.5), "lower frame at 1 - alpha, got {weights:?}");
    assert!(approx(weights[3], 0.5), "upper frame at alpha, got {weights:?}");
    assert!(approx(weights[0], 0.0));
    assert!(approx(weights[1], 0.0));
    assert!(approx(weights[4], 0.0));
}

#[test]
fn two_channels_always_show_frame_one() {
    let (mut scene, root, mesh_key) = morph_scene(2);

    for i in 0..=10 {
        evaluate_at(&mut scene, root, i as f32 / 10.0);
        let weights = influences(&scene, mesh_key);
        assert!(
            approx(weights[0], 0.0) && approx(weights[1], 1.0),
            "a single playable frame holds full weight at any progress, got {weights:?}"
        );
    }
}

#[test]
fn fewer_than_two_channels_stays_static() {
    let (mut scene, root, mesh_key) = morph_scene(1);
    assert_eq!(PoseDriver::detect(&scene, root), PoseDriver::Static);

    evaluate_at(&mut scene, root, 0.7);
    assert!(
        influences(&scene, mesh_key).iter().all(|w| approx(*w, 0.0)),
        "no blendable frames means the base pose is untouched"
    );
}

#[test]
fn evaluation_is_idempotent() {
    let (mut scene, root, mesh_key) = morph_scene(7);

    evaluate_at(&mut scene, root, 0.37);
    let first = influences(&scene, mesh_key);

    evaluate_at(&mut scene, root, 0.37);
    let second = influences(&scene, mesh_key);

    assert_eq!(first, second, "identical progress must produce identical pose");
}

#[test]
fn non_finite_progress_acts_as_zero() {
    let (mut scene, root, mesh_key) = morph_scene(5);

    evaluate_at(&mut scene, root, 0.0);
    let at_zero = influences(&scene, mesh_key);

    evaluate_at(&mut scene, root, 0.8);
    evaluate_at(&mut scene, root, f32::NAN);
    assert_eq!(influences(&scene, mesh_key), at_zero);
}

#[test]
fn out_of_range_progress_clamps() {
    let (mut scene, root, mesh_key) = morph_scene(5);

    evaluate_at(&mut scene, root, 1.0);
    let at_end = influences(&scene, mesh_key);

    evaluate_at(&mut scene, root, 3.5);
    assert_eq!(influences(&scene, mesh_key), at_end);
}

// ============================================================================
// Helper functions
// ============================================================================

#[test]
fn virtual_frame_is_monotonic() {
    let frames_count = 9;
    let mut previous = -1.0_f32;
    for i in 0..=1000 {
        let progress = i as f32 / 1000.0;
        let frame = virtual_frame(progress, frames_count);
        assert!(
            frame >= previous,
            "virtual frame went backwards at progress {progress}"
        );
        previous = frame;
    }
}

#[test]
fn virtual_frame_spans_usable_range() {
    assert!(approx(virtual_frame(0.0, 4), 0.0));
    assert!(approx(virtual_frame(1.0, 4), 3.0));
    // A single usable frame collapses the whole range to zero
    assert!(approx(virtual_frame(0.9, 1), 0.0));
}

#[test]
fn normalized_repairs_bad_input() {
    assert!(approx(normalized(f32::NAN), 0.0));
    assert!(approx(normalized(f32::NEG_INFINITY), 0.0));
    assert!(approx(normalized(-2.0), 0.0));
    assert!(approx(normalized(1.5), 1.0));
    assert!(approx(normalized(0.25), 0.25));
}

// ============================================================================
// Drive mode detection
// ============================================================================

fn weights_clip(node_name: &str, duration: f32) -> AnimationClip {
    let track = Track {
        meta: TrackMeta {
            node_name: node_name.to_string(),
            target: TargetPath::Weights,
        },
        data: TrackData::MorphWeights(KeyframeTrack::new(
            vec![0.0, duration],
            vec![
                MorphWeightData::from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0]),
                MorphWeightData::from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0]),
            ],
            InterpolationMode::Linear,
        )),
    };
    AnimationClip::new("growth".to_string(), vec![track])
}

#[test]
fn detect_prefers_clip_over_shape_keys() {
    let (mut scene, root, _mesh_key) = morph_scene(5);

    let mut mixer = AnimationMixer::new();
    mixer.add_action(AnimationAction::new(Arc::new(weights_clip("model_root", 2.0))));
    scene.animation_mixers.insert(root, mixer);

    assert_eq!(
        PoseDriver::detect(&scene, root),
        PoseDriver::Clip { duration: 2.0 }
    );
}

#[test]
fn detect_shape_keys_without_clip() {
    let (scene, root, _mesh_key) = morph_scene(5);
    assert_eq!(PoseDriver::detect(&scene, root), PoseDriver::ShapeKeys);
}

#[test]
fn detect_static_for_bare_mesh() {
    let (scene, root, _mesh_key) = morph_scene(0);
    assert_eq!(PoseDriver::detect(&scene, root), PoseDriver::Static);
}

// ============================================================================
// Clip scrubbing
// ============================================================================

#[test]
fn clip_evaluation_pins_action_time() {
    let (mut scene, root, _mesh_key) = morph_scene(5);

    let mut mixer = AnimationMixer::new();
    mixer.add_action(AnimationAction::new(Arc::new(weights_clip("model_root", 4.0))));
    scene.animation_mixers.insert(root, mixer);

    let driver = PoseDriver::detect(&scene, root);
    driver.evaluate(&mut scene, root, 0.25);

    let action = &scene.animation_mixers[root].actions()[0];
    assert!(action.paused, "scrubbed actions stay paused");
    assert!(
        approx(action.time, 1.0),
        "time should be duration * progress, got {}",
        action.time
    );
}

#[test]
fn clip_evaluation_drives_mesh_influences() {
    let (mut scene, root, mesh_key) = morph_scene(5);
    let mesh_node = scene.find_node_by_name(root, "Mesh").unwrap();

    let clip = Arc::new(weights_clip("Mesh", 2.0));
    let mut action = AnimationAction::new(Arc::clone(&clip));
    action.bindings.push(PropertyBinding {
        track_index: 0,
        node_handle: mesh_node,
        target: TargetPath::Weights,
    });
    let mut mixer = AnimationMixer::new();
    mixer.add_action(action);
    scene.animation_mixers.insert(root, mixer);

    let driver = PoseDriver::detect(&scene, root);
    driver.evaluate(&mut scene, root, 0.5);
    scene.sync_morph_weights();

    let weights = influences(&scene, mesh_key);
    assert!(
        approx(weights[0], 0.5) && approx(weights[4], 0.5),
        "halfway through the clip blends its two keyframes, got {weights:?}"
    );
}
