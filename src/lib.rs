#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

pub mod resources;
pub mod assets;
pub mod scene;
pub mod review;
pub mod errors;
pub mod utils;
pub mod animation;

pub use resources::{BoundingBox, Geometry, Material, Mesh, Side};
pub use assets::{AssetServer, Locator, Prefab, SharedPrefab};
pub use scene::{Node, NodeHandle, Scene, Transform};
pub use review::{
    Layer, LayerStyle, LoadState, Playback, PoseDriver, ReviewSession, SessionOptions, Timeline,
};
pub use errors::{Result, ReviewError};
pub use utils::Timer;
pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
