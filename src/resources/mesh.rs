use std::sync::Arc;

use crate::resources::Geometry;
use crate::scene::MaterialKey;

/// One renderable surface: shared geometry plus an instance-owned material.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,

    pub geometry: Arc<Geometry>,
    pub material: MaterialKey,

    /// Shape key weights, one per channel including the base duplicate.
    /// Index 0 is the exporter's copy of the rest shape.
    pub morph_target_influences: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: MaterialKey) -> Self {
        let morph_target_influences = vec![0.0; geometry.morph_target_count()];
        Self {
            name: "Mesh".to_string(),
            geometry,
            material,
            morph_target_influences,
        }
    }

    pub fn set_morph_target_influences(&mut self, weights: &[f32]) {
        let count = self.morph_target_influences.len();
        for (slot, value) in self
            .morph_target_influences
            .iter_mut()
            .zip(weights.iter().chain(std::iter::repeat(&0.0)))
            .take(count)
        {
            *slot = *value;
        }
    }
}
