use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetServer, Locator, SharedPrefab};
use crate::errors::ReviewError;
use crate::review::pose::PoseDriver;
use crate::review::slot::{LoadState, ResourceSlot};
use crate::review::style::{self, LayerStyle};
use crate::review::timeline::{DEFAULT_STEP, DEFAULT_TICK_INTERVAL, Timeline};
use crate::scene::{NodeHandle, Scene};

/// The two co-registered model layers of one organoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// The nuclei structure.
    Inner,
    /// The coat structure enclosing it.
    Outer,
}

impl Layer {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Outer => "outer",
        }
    }
}

/// Locator for one layer of an organoid served by the review backend,
/// following the `{base}/organoid/{id}/{layer}` route.
#[must_use]
pub fn organoid_layer_url(base_url: &str, organoid_id: u32, layer: Layer) -> Locator {
    let base = base_url.trim_end_matches('/');
    Locator::Url(format!("{base}/organoid/{organoid_id}/{}", layer.as_str()))
}

/// Initial configuration of a [`ReviewSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub inner_style: LayerStyle,
    pub outer_style: LayerStyle,
    /// Shared placement of the layer group.
    pub group_position: Vec3,
    pub group_scale: f32,
    /// Local placement of each model under the group.
    pub model_position: Vec3,
    pub model_scale: f32,
    /// Timeline increment per auto-play tick.
    pub step: f32,
    /// Seconds between auto-play ticks.
    pub tick_interval: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            inner_style: LayerStyle::nuclei(),
            outer_style: LayerStyle::coat(),
            group_position: Vec3::new(0.0, 1.0, 0.0),
            group_scale: 1.5,
            model_position: Vec3::new(0.0, -1.0, 0.0),
            model_scale: 1.5,
            step: DEFAULT_STEP,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

struct LayerState {
    slot: ResourceSlot,
    style: LayerStyle,
    /// Fixed placement node the instance mounts under.
    anchor: NodeHandle,
    /// Root of the mounted instance, once the slot is ready.
    instance: Option<NodeHandle>,
    /// Which template the instance was built from.
    template: Option<SharedPrefab>,
    driver: PoseDriver,
}

impl LayerState {
    fn new(style: LayerStyle, anchor: NodeHandle) -> Self {
        Self {
            slot: ResourceSlot::new(),
            style,
            anchor,
            instance: None,
            template: None,
            driver: PoseDriver::Static,
        }
    }
}

/// Two synchronized model layers under one timeline.
///
/// The session owns the scene, the timeline and both resource slots, and
/// runs the whole frame pass on one thread: drain loads, mount or unmount
/// instances, advance the timeline, then pose both layers against a single
/// position snapshot. The layer group stays invisible until both layers
/// are mounted, so a half-loaded pair never renders one model alone.
pub struct ReviewSession {
    scene: Scene,
    server: AssetServer,
    timeline: Timeline,
    group: NodeHandle,
    inner: LayerState,
    outer: LayerState,
}

impl ReviewSession {
    #[must_use]
    pub fn new(server: AssetServer, options: &SessionOptions) -> Self {
        let mut scene = Scene::new();

        let group = scene
            .build_node("organoid_group")
            .with_position(
                options.group_position.x,
                options.group_position.y,
                options.group_position.z,
            )
            .with_scale(options.group_scale)
            .with_visible(false)
            .build();

        let inner_anchor = scene
            .build_node("inner_layer")
            .with_position(
                options.model_position.x,
                options.model_position.y,
                options.model_position.z,
            )
            .with_scale(options.model_scale)
            .with_parent(group)
            .build();

        let outer_anchor = scene
            .build_node("outer_layer")
            .with_position(
                options.model_position.x,
                options.model_position.y,
                options.model_position.z,
            )
            .with_scale(options.model_scale)
            .with_parent(group)
            .build();

        let timeline = Timeline::new()
            .with_step(options.step)
            .with_tick_interval(options.tick_interval);

        Self {
            scene,
            server,
            timeline,
            group,
            inner: LayerState::new(options.inner_style, inner_anchor),
            outer: LayerState::new(options.outer_style, outer_anchor),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Points `layer` at a new source. Supersedes any load in flight.
    pub fn set_locator(&mut self, layer: Layer, locator: Locator) {
        let server = self.server.clone();
        self.layer_mut(layer).slot.request(&server, locator);
    }

    /// Requests both layers of one organoid from the review backend.
    pub fn load_organoid(&mut self, base_url: &str, organoid_id: u32) {
        self.set_locator(
            Layer::Inner,
            organoid_layer_url(base_url, organoid_id, Layer::Inner),
        );
        self.set_locator(
            Layer::Outer,
            organoid_layer_url(base_url, organoid_id, Layer::Outer),
        );
    }

    /// Injects an already-built template for `layer`, bypassing the loader.
    pub fn provide_model(&mut self, layer: Layer, prefab: SharedPrefab) {
        self.layer_mut(layer).slot.provide(prefab);
    }

    /// Empties `layer` and tears its instance down immediately.
    pub fn clear_layer(&mut self, layer: Layer) {
        self.layer_mut(layer).slot.clear();
        self.reconcile_layer(layer);
    }

    /// Restyles `layer`; a mounted instance is restyled on the spot.
    pub fn set_style(&mut self, layer: Layer, style: LayerStyle) {
        self.layer_mut(layer).style = style;
        if let Some(root) = self.layer(layer).instance {
            style::apply_layer_style(&mut self.scene, root, &style);
        }
    }

    // ========================================================================
    // Timeline controls
    // ========================================================================

    pub fn seek(&mut self, value: f32) {
        self.timeline.seek(value);
    }

    pub fn play(&mut self) {
        self.timeline.play();
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        self.timeline.position()
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    // ========================================================================
    // Frame pass
    // ========================================================================

    /// One cooperative frame pass.
    ///
    /// Finished loads are drained first, instances are reconciled against
    /// their slots, the timeline advances by `dt`, and then both layers are
    /// posed against one position snapshot before matrices and morph data
    /// refresh. Nothing here runs off-thread; a scrub and an evaluation can
    /// never interleave.
    pub fn update(&mut self, dt: f32) {
        self.inner.slot.poll();
        self.outer.slot.poll();

        self.reconcile_layer(Layer::Inner);
        self.reconcile_layer(Layer::Outer);

        self.timeline.advance(dt);

        // One snapshot for both layers
        let progress = self.timeline.position();
        let ready = self.is_ready();

        if let Some(node) = self.scene.get_node_mut(self.group) {
            node.visible = ready;
        }

        if ready {
            if let Some(root) = self.inner.instance {
                self.inner.driver.evaluate(&mut self.scene, root, progress);
            }
            if let Some(root) = self.outer.instance {
                self.outer.driver.evaluate(&mut self.scene, root, progress);
            }
        }

        self.scene.sync_morph_weights();
        self.scene.update_matrix_world();
    }

    /// Both layers loaded and mounted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.instance.is_some() && self.outer.instance.is_some()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn server(&self) -> &AssetServer {
        &self.server
    }

    /// The shared placement node both layers hang off.
    #[must_use]
    pub fn group(&self) -> NodeHandle {
        self.group
    }

    #[must_use]
    pub fn layer_state(&self, layer: Layer) -> LoadState {
        self.layer(layer).slot.state()
    }

    #[must_use]
    pub fn layer_error(&self, layer: Layer) -> Option<&ReviewError> {
        self.layer(layer).slot.last_error()
    }

    /// Root node of the mounted instance for `layer`, if any.
    #[must_use]
    pub fn instance_root(&self, layer: Layer) -> Option<NodeHandle> {
        self.layer(layer).instance
    }

    #[must_use]
    pub fn driver(&self, layer: Layer) -> PoseDriver {
        self.layer(layer).driver
    }

    #[must_use]
    pub fn style(&self, layer: Layer) -> LayerStyle {
        self.layer(layer).style
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn layer(&self, layer: Layer) -> &LayerState {
        match layer {
            Layer::Inner => &self.inner,
            Layer::Outer => &self.outer,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut LayerState {
        match layer {
            Layer::Inner => &mut self.inner,
            Layer::Outer => &mut self.outer,
        }
    }

    /// Brings the mounted instance in line with what the slot holds:
    /// unmounts a stale or cleared instance, mounts a fresh template, and
    /// fixes the drive mode and style for the new subtree.
    fn reconcile_layer(&mut self, layer: Layer) {
        let desired: Option<SharedPrefab> = if self.layer(layer).slot.is_ready() {
            self.layer(layer).slot.prefab().cloned()
        } else {
            None
        };

        let current_matches = match (&desired, &self.layer(layer).template) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if current_matches {
            return;
        }

        if let Some(root) = self.layer(layer).instance {
            log::debug!("unmounting {} layer instance", layer.as_str());
            self.scene.remove_node(root);
        }
        {
            let state = self.layer_mut(layer);
            state.instance = None;
            state.template = None;
            state.driver = PoseDriver::Static;
        }

        let Some(prefab) = desired else {
            return;
        };

        let root = self.scene.instantiate(&prefab);
        self.scene.attach(root, self.layer(layer).anchor);

        let driver = PoseDriver::detect(&self.scene, root);
        let style = self.layer(layer).style;
        style::apply_layer_style(&mut self.scene, root, &style);

        log::info!(
            "{} layer ready: '{}' driven by {:?}",
            layer.as_str(),
            prefab.name,
            driver
        );

        let state = self.layer_mut(layer);
        state.instance = Some(root);
        state.template = Some(prefab);
        state.driver = driver;
    }
}
