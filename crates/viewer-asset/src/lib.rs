//! Provide asset handling for the viewer.
//!
//! Models are kept as flat, index-based tables in the same shape as GLTF:
//! nodes, scenes, skins and animations refer to each other by index. The
//! `gltf` feature provides a loader that fills these tables from GLTF and
//! GLB files.
//!
pub mod animation;
/// Model loaders
pub mod loader;
pub mod model;
pub mod node;
pub mod scene;
pub mod skin;
