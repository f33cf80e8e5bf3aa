use glam::Vec4;
use uuid::Uuid;

/// Which faces get rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    Front,
    Back,
    #[default]
    Double,
}

/// Surface appearance for one mesh instance.
///
/// Loaded models carry a material template; every instance gets its own
/// clone so per-layer styling never leaks into the cached template or
/// into sibling instances.
#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: Uuid,
    pub name: Option<String>,

    /// Base color, linear RGBA. Alpha is folded into `opacity` at load time.
    pub color: Vec4,
    pub opacity: f32,

    pub transparent: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub side: Side,

    version: u64,
}

impl Material {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            color,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            depth_test: true,
            side: Side::default(),
            version: 0,
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn mark_dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
        self.mark_dirty();
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
        self.mark_dirty();
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}
