//! Format-specific model parsers.

#[cfg(feature = "gltf")]
pub mod gltf;
