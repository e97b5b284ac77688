use glam::Mat4;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinAsset {
    pub name: Option<String>,
    /// Node indices, in the order the vertex joint attributes refer to them.
    pub joints: Vec<usize>,
    /// One matrix per joint, as stored in the asset.
    pub inverse_bind_matrices: Vec<Mat4>,
    pub skeleton: Option<usize>,
}
