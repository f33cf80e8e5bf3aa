use std::sync::OnceLock;

use glam::Vec3;
use uuid::Uuid;

/// Axis-aligned bounding box in the geometry's local space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if points.is_empty() {
            return Self::default();
        }
        Self { min, max }
    }
}

/// Static triangle mesh data plus its per-target shape key displacements.
///
/// Geometry is immutable once built and shared between instances via `Arc`,
/// so the bounding box is computed lazily behind a `OnceLock`.
#[derive(Debug, Default)]
pub struct Geometry {
    pub uuid: Uuid,

    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,

    /// One displacement set per shape key channel, each `positions.len()` long.
    pub morph_positions: Vec<Vec<Vec3>>,
    pub morph_normals: Vec<Vec<Vec3>>,
    pub morph_target_names: Vec<String>,

    bounding_box: OnceLock<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Number of shape key channels, counting the exporter's base duplicate.
    #[must_use]
    pub fn morph_target_count(&self) -> usize {
        self.morph_positions.len()
    }

    #[must_use]
    pub fn has_morph_targets(&self) -> bool {
        !self.morph_positions.is_empty()
    }

    #[must_use]
    pub fn name_of_target(&self, index: usize) -> Option<&str> {
        self.morph_target_names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        *self
            .bounding_box
            .get_or_init(|| BoundingBox::from_points(&self.positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_spans_all_positions() {
        let mut geometry = Geometry::new();
        geometry.positions = vec![
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.5),
            Vec3::new(0.0, 1.0, -4.0),
        ];

        let bounds = geometry.bounding_box();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 2.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, -0.5, -1.0));
    }

    #[test]
    fn empty_geometry_has_default_bounds() {
        let geometry = Geometry::new();
        assert_eq!(geometry.bounding_box(), BoundingBox::default());
    }
}
