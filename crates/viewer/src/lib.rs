//! Skeletal animation for skinned glTF characters.
//!
//! A [`instance::Model`] holds the scene graph, skins and clips of one
//! loaded character. Every [`instance::SkinnedInstance`] of it samples the
//! active clip, poses the graph and produces the joint matrices a skinning
//! shader consumes.
pub mod animation;
pub mod camera;
pub mod instance;
pub mod params;
pub mod scene;
pub mod skin;
pub mod skinning;

pub use viewer_asset as asset;
