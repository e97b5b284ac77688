use glam::Mat4;
use log::trace;
use viewer_asset::node::DecomposedTransform;

use crate::scene::SceneGraph;

use super::{AnimationClip, ChannelProperty, Playback};

/// Per-frame local transforms of every node in a graph.
///
/// Starts from the rest transforms of the graph. Nodes without animated
/// channels keep their rest matrix untouched.
#[derive(Debug, Clone)]
pub struct Pose {
    rest_transforms: Vec<DecomposedTransform>,
    rest_locals: Vec<Mat4>,
    transforms: Vec<DecomposedTransform>,
    locals: Vec<Mat4>,
    animated: Vec<bool>,
}

impl Pose {
    pub fn new(graph: &SceneGraph) -> Self {
        let rest_transforms: Vec<DecomposedTransform> = graph
            .nodes()
            .iter()
            .map(|node| node.transform().decomposed())
            .collect();
        let rest_locals: Vec<Mat4> = graph
            .nodes()
            .iter()
            .map(|node| node.transform().matrix())
            .collect();
        Self {
            transforms: rest_transforms.clone(),
            locals: rest_locals.clone(),
            animated: vec![false; rest_locals.len()],
            rest_transforms,
            rest_locals,
        }
    }

    /// Return every node to its rest transform.
    pub fn reset(&mut self) {
        self.transforms.clone_from(&self.rest_transforms);
        self.locals.clone_from(&self.rest_locals);
        self.animated.fill(false);
    }

    pub fn transforms(&self) -> &[DecomposedTransform] {
        &self.transforms
    }

    /// Local matrices, indexed by node.
    pub fn locals(&self) -> &[Mat4] {
        &self.locals
    }

    fn update_locals(&mut self) {
        for (index, animated) in self.animated.iter().enumerate() {
            if *animated {
                self.locals[index] = self.transforms[index].matrix();
            }
        }
    }
}

/// Pose `graph` by `clip` at `elapsed` seconds.
///
/// The pose is reset to rest first, so the result only depends on the
/// arguments. Each channel replaces one component of its target's
/// transform; animated nodes are then recomposed as translate, rotate,
/// scale.
pub fn evaluate(
    clip: &AnimationClip,
    graph: &SceneGraph,
    elapsed: f32,
    playback: Playback,
    pose: &mut Pose,
) {
    debug_assert_eq!(pose.locals.len(), graph.len());
    pose.reset();

    let time = playback.clip_time(elapsed, clip.duration());
    trace!("Animate time: {:#.03}s", time);

    for channel in clip.channels() {
        let index = channel.target().index();
        let Some(transform) = pose.transforms.get_mut(index) else {
            continue;
        };
        match channel.property() {
            ChannelProperty::Translation(sampler) => transform.translation = sampler.sample(time),
            ChannelProperty::Rotation(sampler) => transform.rotation = sampler.sample(time),
            ChannelProperty::Scale(sampler) => transform.scale = sampler.sample(time),
        }
        pose.animated[index] = true;
    }

    pose.update_locals();
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Quat, Vec3};
    use viewer_asset::node::{MatrixNodeTransform, NodeTransform};

    use super::{evaluate, Pose};
    use crate::{
        animation::{test::wave_animation, AnimationClip, Playback},
        scene::{test::chain_model, SceneGraph},
    };

    fn setup() -> (SceneGraph, AnimationClip) {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let clip = AnimationClip::from_asset(&graph, &wave_animation()).unwrap();
        (graph, clip)
    }

    #[test]
    fn test_rest_pose() {
        let (graph, _) = setup();
        let pose = Pose::new(&graph);
        assert_eq!(pose.locals(), graph.local_matrices().as_slice());
    }

    #[test]
    fn test_evaluate_channels() {
        let (graph, clip) = setup();
        let mut pose = Pose::new(&graph);

        evaluate(&clip, &graph, 1.0, Playback::Repeat, &mut pose);
        let arm = pose.transforms()[1];
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert!(arm.rotation.abs_diff_eq(expected, 1e-6));
        // The rest translation survives a rotation-only channel.
        assert_eq!(arm.translation, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(pose.transforms()[2].translation, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(pose.locals()[1], arm.matrix());
        // Untouched nodes keep their rest matrix.
        assert_eq!(pose.locals()[3], graph.local_matrices()[3]);
    }

    #[test]
    fn test_evaluate_wraps_time() {
        let (graph, clip) = setup();
        let mut wrapped = Pose::new(&graph);
        let mut direct = Pose::new(&graph);

        evaluate(&clip, &graph, 2.5, Playback::Repeat, &mut wrapped);
        evaluate(&clip, &graph, 0.5, Playback::Repeat, &mut direct);
        assert_eq!(wrapped.locals(), direct.locals());
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let (graph, clip) = setup();
        let mut pose = Pose::new(&graph);

        evaluate(&clip, &graph, 0.7, Playback::Repeat, &mut pose);
        let first = pose.locals().to_vec();
        evaluate(&clip, &graph, 1.3, Playback::Repeat, &mut pose);
        evaluate(&clip, &graph, 0.7, Playback::Repeat, &mut pose);
        assert_eq!(pose.locals(), first.as_slice());
    }

    #[test]
    fn test_animate_matrix_node() {
        let mut model = chain_model();
        let rest = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(1.0, 0.0, 0.0),
        );
        model.nodes[1].transform = NodeTransform::Matrix(MatrixNodeTransform(rest));
        let graph = SceneGraph::from_asset(&model).unwrap();
        let clip = AnimationClip::from_asset(&graph, &wave_animation()).unwrap();
        let mut pose = Pose::new(&graph);

        evaluate(&clip, &graph, 0.0, Playback::Repeat, &mut pose);
        let arm = pose.transforms()[1];
        assert!(arm.scale.abs_diff_eq(Vec3::splat(2.0), 1e-6));
        assert!(arm.translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(pose.locals()[1].abs_diff_eq(rest, 1e-5));
    }
}
