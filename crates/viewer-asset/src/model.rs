use crate::{animation::AnimationAsset, node::NodeAsset, scene::SceneAsset, skin::SkinAsset};

/// Everything loaded from a single model file, kept as flat tables.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelAsset {
    pub name: Option<String>,
    pub nodes: Vec<NodeAsset>,
    pub scenes: Vec<SceneAsset>,
    pub default_scene: Option<usize>,
    pub skins: Vec<SkinAsset>,
    pub animations: Vec<AnimationAsset>,
}

impl ModelAsset {
    /// The scene to display: the declared default, or the first one.
    pub fn scene(&self) -> Option<&SceneAsset> {
        self.default_scene
            .and_then(|index| self.scenes.get(index))
            .or_else(|| self.scenes.first())
    }
}
