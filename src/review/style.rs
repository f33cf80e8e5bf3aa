use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::{NodeHandle, Scene};

/// Tint and translucency for one model layer.
///
/// Styles are fixed per layer and never depend on the review position;
/// they are re-applied only when the style inputs themselves change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub opacity: f32,
    /// RGB override in [0, 1] per channel; `None` keeps the authored
    /// material colors.
    pub color: Option<Vec3>,
}

impl LayerStyle {
    /// Warm preset for the inner nuclei layer, `#df5c5c` at half opacity.
    #[must_use]
    pub fn nuclei() -> Self {
        Self {
            opacity: 0.5,
            color: parse_hex_color("#df5c5c"),
        }
    }

    /// Cool preset for the outer coat layer, `#305064` at half opacity.
    #[must_use]
    pub fn coat() -> Self {
        Self {
            opacity: 0.5,
            color: parse_hex_color("#305064"),
        }
    }

    #[must_use]
    pub fn opaque() -> Self {
        Self {
            opacity: 1.0,
            color: None,
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::opaque()
    }
}

/// Parses `#rrggbb` (the `#` is optional) into RGB in [0, 1].
/// Returns `None` for anything malformed.
#[must_use]
pub fn parse_hex_color(text: &str) -> Option<Vec3> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;

    let r = ((value >> 16) & 0xFF) as f32 / 255.0;
    let g = ((value >> 8) & 0xFF) as f32 / 255.0;
    let b = (value & 0xFF) as f32 / 255.0;
    Some(Vec3::new(r, g, b))
}

/// Applies `style` to the material of every mesh under `root`.
///
/// Blending is forced on unconditionally so opacity always takes effect,
/// and depth writes are enabled only at full opacity. The two layers
/// overlap in space; a translucent surface that still wrote depth would
/// occlude the layer behind it and flicker.
///
/// Idempotent, so callers may re-apply on any style change.
pub fn apply_layer_style(scene: &mut Scene, root: NodeHandle, style: &LayerStyle) {
    let opacity = if style.opacity.is_finite() {
        style.opacity.clamp(0.0, 1.0)
    } else {
        1.0
    };

    for handle in scene.subtree_nodes(root) {
        let Some(mesh_key) = scene.get_node(handle).and_then(|n| n.mesh) else {
            continue;
        };
        let Some(material_key) = scene.meshes.get(mesh_key).map(|m| m.material) else {
            continue;
        };
        let Some(material) = scene.materials.get_mut(material_key) else {
            continue;
        };

        material.transparent = true;
        material.opacity = opacity;
        if let Some(rgb) = style.color {
            // Alpha lives in `opacity`; the color override replaces rgb only.
            material.color = rgb.extend(material.color.w);
        }
        material.depth_write = opacity >= 1.0;
        material.mark_dirty();
    }
}
