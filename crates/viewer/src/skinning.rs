use bytemuck::cast_slice;
use glam::Mat4;
use log::warn;

use crate::{scene::SceneGraph, skin::BoundSkin};

/// Final joint matrices of one skin, in skin joint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointMatrices {
    items: Vec<Mat4>,
}

impl JointMatrices {
    pub fn as_slice(&self) -> &[Mat4] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Column-major `f32` data, ready for a uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.items)
    }
}

impl FromIterator<Mat4> for JointMatrices {
    fn from_iter<T: IntoIterator<Item = Mat4>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Recomputes joint matrices from posed local transforms.
///
/// Holds the scratch buffer of global transforms between calls.
#[derive(Debug, Default)]
pub struct SkinningUpdater {
    globals: Vec<Mat4>,
}

impl SkinningUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Globals computed by the last [`update`](Self::update), indexed by
    /// node. Only entries under the skin root are meaningful.
    pub fn globals(&self) -> &[Mat4] {
        &self.globals
    }

    pub fn update(
        &mut self,
        skin: &BoundSkin,
        graph: &SceneGraph,
        locals: &[Mat4],
        output: &mut JointMatrices,
    ) {
        if locals.len() != graph.len() {
            warn!(
                "Skinning skipped: {} local transforms for {} nodes",
                locals.len(),
                graph.len()
            );
            return;
        }

        self.globals.clear();
        self.globals.resize(graph.len(), Mat4::IDENTITY);
        graph.propagate(skin.root(), Mat4::IDENTITY, locals, &mut self.globals);

        output.items.clear();
        output.items.extend(
            skin.joints()
                .iter()
                .zip(skin.inverse_bind_matrices())
                .map(|(joint, inverse_bind)| self.globals[joint.index()] * *inverse_bind),
        );
    }
}

/// One-shot variant of [`SkinningUpdater::update`].
pub fn joint_matrices(skin: &BoundSkin, graph: &SceneGraph, locals: &[Mat4]) -> JointMatrices {
    let mut output = JointMatrices::default();
    SkinningUpdater::new().update(skin, graph, locals, &mut output);
    output
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Quat, Vec3};

    use super::{joint_matrices, JointMatrices, SkinningUpdater};
    use crate::{
        animation::{
            evaluator::{evaluate, Pose},
            test::wave_animation,
            AnimationClip, Playback,
        },
        scene::{test::chain_model, SceneGraph},
        skin::{test::arm_skin, SkinBinder},
    };

    #[test]
    fn test_rest_locals_give_identity() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let skin = SkinBinder::bind(&graph, &arm_skin(&graph)).unwrap();
        let joints = joint_matrices(&skin, &graph, &graph.local_matrices());
        assert_eq!(joints.len(), 2);
        for matrix in joints.as_slice() {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_root_global_is_local() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let skin = SkinBinder::bind(&graph, &arm_skin(&graph)).unwrap();
        let mut locals = graph.local_matrices();
        locals[1] = Mat4::from_rotation_translation(Quat::from_rotation_x(0.3), Vec3::Y);

        let mut updater = SkinningUpdater::new();
        let mut output = JointMatrices::default();
        updater.update(&skin, &graph, &locals, &mut output);
        assert_eq!(updater.globals()[1], locals[1]);
        assert_eq!(updater.globals()[2], locals[1] * locals[2]);
        assert_eq!(
            output.as_slice()[0],
            locals[1] * skin.inverse_bind_matrices()[0]
        );
    }

    #[test]
    fn test_animated_joints() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let skin = SkinBinder::bind(&graph, &arm_skin(&graph)).unwrap();
        let clip = AnimationClip::from_asset(&graph, &wave_animation()).unwrap();
        let mut pose = Pose::new(&graph);

        // At 1s the arm rotation key equals its rest rotation.
        evaluate(&clip, &graph, 1.0, Playback::Repeat, &mut pose);
        let joints = joint_matrices(&skin, &graph, pose.locals());
        assert!(joints.as_slice()[0].abs_diff_eq(Mat4::IDENTITY, 1e-5));

        // The hand is moved by (0, 1, 0) in arm space, which points along -X.
        let hand_rest = graph.local_matrices()[1] * graph.local_matrices()[2];
        let moved = joints.as_slice()[1] * hand_rest;
        let origin = moved.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5), "{}", origin);
    }

    #[test]
    fn test_as_bytes() {
        let joints: JointMatrices = [Mat4::IDENTITY, Mat4::from_translation(Vec3::X)]
            .into_iter()
            .collect();
        let bytes = joints.as_bytes();
        assert_eq!(bytes.len(), 2 * 16 * 4);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[64 + 48..64 + 52], &1.0f32.to_le_bytes());
    }
}
