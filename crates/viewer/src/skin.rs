use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;
use log::debug;
use viewer_asset::skin::SkinAsset;

use crate::{
    scene::{NodeId, SceneGraph},
    skinning::JointMatrices,
};

/// Largest joint array the rendering stage accepts per skin.
pub const MAX_JOINTS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkinError {
    NoJoints,
    TooManyJoints(usize),
    BadJoint(usize),
    BadSkeleton(usize),
    InverseBindCountMismatch(usize, usize),
    JointOutsideHierarchy(NodeId, NodeId),
    NoCommonRoot(NodeId),
}

impl Display for SkinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SkinError::NoJoints => write!(f, "Skin has no joints"),
            SkinError::TooManyJoints(count) => write!(
                f,
                "Skin has {} joints, at most {} are supported",
                count, MAX_JOINTS
            ),
            SkinError::BadJoint(index) => write!(f, "Skin refers to unknown joint node #{}", index),
            SkinError::BadSkeleton(index) => {
                write!(f, "Skin refers to unknown skeleton node #{}", index)
            }
            SkinError::InverseBindCountMismatch(joints, matrices) => write!(
                f,
                "Skin has {} joints but {} inverse bind matrices",
                joints, matrices
            ),
            SkinError::JointOutsideHierarchy(joint, root) => {
                write!(f, "Joint {} is not below skin root {}", joint, root)
            }
            SkinError::NoCommonRoot(joint) => {
                write!(f, "Joint {} shares no ancestor with the other joints", joint)
            }
        }
    }
}

impl Error for SkinError {}

/// A skin validated against its scene graph.
#[derive(Debug, Clone)]
pub struct BoundSkin {
    name: Option<String>,
    root: NodeId,
    joints: Vec<NodeId>,
    inverse_bind_matrices: Vec<Mat4>,
    bind_globals: Vec<Mat4>,
    // node id -> index of joints
    joint_lookup: BTreeMap<NodeId, usize>,
}

impl BoundSkin {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Top of the hierarchy the joint transforms are computed from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn joints(&self) -> &[NodeId] {
        &self.joints
    }

    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// Global transform of each joint at bind time, relative to the root.
    pub fn bind_globals(&self) -> &[Mat4] {
        &self.bind_globals
    }

    pub fn joint_index(&self, node: NodeId) -> Option<usize> {
        self.joint_lookup.get(&node).copied()
    }

    /// Joint matrices of the rest pose.
    pub fn bind_pose(&self) -> JointMatrices {
        self.bind_globals
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(global, inverse_bind)| *global * *inverse_bind)
            .collect()
    }
}

pub struct SkinBinder;

impl SkinBinder {
    /// Validate `asset` against `graph` and compute its bind pose.
    ///
    /// Any inconsistency aborts the whole skin.
    pub fn bind(graph: &SceneGraph, asset: &SkinAsset) -> Result<BoundSkin, SkinError> {
        if asset.joints.is_empty() {
            return Err(SkinError::NoJoints);
        }
        if asset.joints.len() > MAX_JOINTS {
            return Err(SkinError::TooManyJoints(asset.joints.len()));
        }
        let joints = asset
            .joints
            .iter()
            .map(|&index| {
                let id = NodeId(index);
                if graph.contains(id) {
                    Ok(id)
                } else {
                    Err(SkinError::BadJoint(index))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if asset.inverse_bind_matrices.len() != joints.len() {
            return Err(SkinError::InverseBindCountMismatch(
                joints.len(),
                asset.inverse_bind_matrices.len(),
            ));
        }

        let root = match asset.skeleton {
            Some(index) if graph.contains(NodeId(index)) => NodeId(index),
            Some(index) => return Err(SkinError::BadSkeleton(index)),
            None => Self::common_root(graph, &joints)?,
        };
        if let Some(joint) = joints
            .iter()
            .find(|joint| !graph.is_descendant(**joint, root))
        {
            return Err(SkinError::JointOutsideHierarchy(*joint, root));
        }

        let locals = graph.local_matrices();
        let mut globals = vec![Mat4::IDENTITY; graph.len()];
        graph.propagate(root, Mat4::IDENTITY, &locals, &mut globals);
        let bind_globals = joints.iter().map(|joint| globals[joint.index()]).collect();

        let joint_lookup = joints
            .iter()
            .enumerate()
            .map(|(index, joint)| (*joint, index))
            .collect();

        debug!(
            "Bound skin {} with {} joints under root {}",
            asset.name.as_deref().unwrap_or("<unnamed>"),
            joints.len(),
            root
        );
        Ok(BoundSkin {
            name: asset.name.clone(),
            root,
            joints,
            inverse_bind_matrices: asset.inverse_bind_matrices.clone(),
            bind_globals,
            joint_lookup,
        })
    }

    /// Deepest node that every joint descends from.
    fn common_root(graph: &SceneGraph, joints: &[NodeId]) -> Result<NodeId, SkinError> {
        let first = joints[0];
        let mut candidate = Some(first);
        while let Some(id) = candidate {
            if joints.iter().all(|joint| graph.is_descendant(*joint, id)) {
                return Ok(id);
            }
            candidate = graph.node(id).and_then(|node| node.parent());
        }
        Err(SkinError::NoCommonRoot(first))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use glam::{Mat4, Vec3};
    use viewer_asset::skin::SkinAsset;

    use super::{SkinBinder, SkinError};
    use crate::scene::{test::chain_model, NodeId, SceneGraph};

    /// Skin over arm and hand whose inverse bind matrices invert the rest pose.
    pub(crate) fn arm_skin(graph: &SceneGraph) -> SkinAsset {
        let locals = graph.local_matrices();
        let arm = locals[1];
        let hand = locals[1] * locals[2];
        SkinAsset {
            name: Some("arm".to_string()),
            joints: vec![1, 2],
            inverse_bind_matrices: vec![arm.inverse(), hand.inverse()],
            skeleton: None,
        }
    }

    #[test]
    fn test_bind_pose_is_identity() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let skin = SkinBinder::bind(&graph, &arm_skin(&graph)).unwrap();
        assert_eq!(skin.root(), NodeId(1));
        assert_eq!(skin.joint_index(NodeId(2)), Some(1));
        assert_eq!(skin.joint_index(NodeId(3)), None);
        // The root joint ignores everything above it.
        assert_eq!(skin.bind_globals()[0], graph.local_matrices()[1]);
        for matrix in skin.bind_pose().as_slice() {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5), "{}", matrix);
        }
    }

    #[test]
    fn test_common_root() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let skin = SkinAsset {
            joints: vec![2, 3],
            inverse_bind_matrices: vec![Mat4::IDENTITY; 2],
            ..Default::default()
        };
        let skin = SkinBinder::bind(&graph, &skin).unwrap();
        assert_eq!(skin.root(), NodeId(0));
        let hand = skin.bind_globals()[0].transform_point3(Vec3::ZERO);
        assert!(hand.abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-5));
    }

    #[test]
    fn test_reject_bad_skins() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();

        let mut skin = arm_skin(&graph);
        skin.inverse_bind_matrices.pop();
        assert_eq!(
            SkinBinder::bind(&graph, &skin).unwrap_err(),
            SkinError::InverseBindCountMismatch(2, 1)
        );

        let mut skin = arm_skin(&graph);
        skin.joints[1] = 12;
        assert_eq!(
            SkinBinder::bind(&graph, &skin).unwrap_err(),
            SkinError::BadJoint(12)
        );

        let mut skin = arm_skin(&graph);
        skin.skeleton = Some(2);
        assert_eq!(
            SkinBinder::bind(&graph, &skin).unwrap_err(),
            SkinError::JointOutsideHierarchy(NodeId(1), NodeId(2))
        );

        let skin = SkinAsset::default();
        assert_eq!(
            SkinBinder::bind(&graph, &skin).unwrap_err(),
            SkinError::NoJoints
        );
    }
}
