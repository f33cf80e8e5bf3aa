mod geometry;
mod material;
mod mesh;

pub use geometry::{BoundingBox, Geometry};
pub use material::{Material, Side};
pub use mesh::Mesh;
