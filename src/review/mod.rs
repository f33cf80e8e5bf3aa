//! The review core: one timeline scrubbing two synchronized organoid
//! layers, with per-layer styling and readiness tracking.

mod pose;
mod session;
mod slot;
mod style;
mod timeline;

pub use pose::{PoseDriver, normalized, virtual_frame};
pub use session::{Layer, ReviewSession, SessionOptions, organoid_layer_url};
pub use slot::{LoadState, ResourceSlot};
pub use style::{LayerStyle, apply_layer_style, parse_hex_color};
pub use timeline::{DEFAULT_STEP, DEFAULT_TICK_INTERVAL, Playback, Timeline};
