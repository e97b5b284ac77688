use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use glam::{Mat4, Quat, Vec3};
use log::{debug, trace};
use viewer_asset::model::ModelAsset;

use crate::{
    animation::{
        evaluator::{evaluate, Pose},
        AnimationClip, ClipError, Playback,
    },
    params::PlacementParams,
    scene::{SceneError, SceneGraph},
    skin::{BoundSkin, SkinBinder, SkinError},
    skinning::{JointMatrices, SkinningUpdater},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Scene(SceneError),
    Skin(usize, SkinError),
    Clip(usize, ClipError),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Scene(error) => write!(f, "Bad scene graph: {}", error),
            ModelError::Skin(index, error) => write!(f, "Bad skin #{}: {}", index, error),
            ModelError::Clip(index, error) => write!(f, "Bad animation #{}: {}", index, error),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelError::Scene(error) => Some(error),
            ModelError::Skin(_, error) => Some(error),
            ModelError::Clip(_, error) => Some(error),
        }
    }
}

impl From<SceneError> for ModelError {
    fn from(error: SceneError) -> Self {
        ModelError::Scene(error)
    }
}

/// Immutable data of a loaded character, shared by all its instances.
#[derive(Debug)]
pub struct Model {
    name: Option<String>,
    graph: SceneGraph,
    skins: Vec<BoundSkin>,
    clips: Vec<AnimationClip>,
}

impl Model {
    pub fn from_asset(asset: &ModelAsset) -> Result<Self, ModelError> {
        let graph = SceneGraph::from_asset(asset)?;
        let skins = asset
            .skins
            .iter()
            .enumerate()
            .map(|(index, skin)| {
                SkinBinder::bind(&graph, skin).map_err(|error| ModelError::Skin(index, error))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let clips = asset
            .animations
            .iter()
            .enumerate()
            .map(|(index, animation)| {
                AnimationClip::from_asset(&graph, animation)
                    .map_err(|error| ModelError::Clip(index, error))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Model {}: {} nodes, {} skins, {} clips",
            asset.name.as_deref().unwrap_or("<unnamed>"),
            graph.len(),
            skins.len(),
            clips.len()
        );
        Ok(Self {
            name: asset.name.clone(),
            graph,
            skins,
            clips,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn skins(&self) -> &[BoundSkin] {
        &self.skins
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name() == Some(name))
    }
}

/// Where one instance stands in the world.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub position: Vec3,
    /// Heading in degrees. Turns the upright model around world +Y.
    pub angle: f32,
}

impl Placement {
    pub fn model_matrix(&self, params: &PlacementParams) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(Vec3::splat(params.scale))
            * Mat4::from_translation(params.lift)
            * Mat4::from_quat(Quat::from_rotation_x(params.upright_degrees.to_radians()))
            * Mat4::from_quat(Quat::from_rotation_z(self.angle.to_radians()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Showing the bind pose, nothing evaluated yet.
    Bound,
    /// Posed by the active clip every update.
    Animating,
}

/// One placed copy of a [`Model`] with its own animation state.
#[derive(Debug)]
pub struct SkinnedInstance {
    model: Arc<Model>,
    placement: Placement,
    clip: Option<usize>,
    playback: Playback,
    state: InstanceState,
    last_time: f32,
    pose: Pose,
    globals: Vec<Mat4>,
    updater: SkinningUpdater,
    joints: Vec<JointMatrices>,
}

impl SkinnedInstance {
    /// Starts in the bind pose with the first clip selected.
    pub fn new(model: Arc<Model>, placement: Placement) -> Self {
        let pose = Pose::new(model.graph());
        let globals = model.graph().global_matrices(pose.locals());
        let joints = model.skins().iter().map(BoundSkin::bind_pose).collect();
        let clip = if model.clips().is_empty() { None } else { Some(0) };
        Self {
            model,
            placement,
            clip,
            playback: Playback::default(),
            state: InstanceState::Bound,
            last_time: 0.0,
            pose,
            globals,
            updater: SkinningUpdater::new(),
            joints,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn clip(&self) -> Option<&AnimationClip> {
        self.clip.and_then(|index| self.model.clips().get(index))
    }

    /// Select the clip played from the next update on. `None` freezes the
    /// current pose. Returns false for an unknown index.
    pub fn set_clip(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(index) if index >= self.model.clips().len() => false,
            index => {
                self.clip = index;
                true
            }
        }
    }

    pub fn set_clip_by_name(&mut self, name: &str) -> bool {
        match self.model.clip_index(name) {
            Some(index) => self.set_clip(Some(index)),
            None => false,
        }
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn set_playback(&mut self, playback: Playback) {
        self.playback = playback;
    }

    /// Pose the instance at `time` seconds of playback.
    ///
    /// A fresh instance stays in its bind pose until time moves away from
    /// zero.
    pub fn update(&mut self, time: f32) {
        let Some(clip) = self.clip.and_then(|index| self.model.clips().get(index)) else {
            return;
        };
        if self.state == InstanceState::Bound {
            if time == 0.0 || time == self.last_time {
                return;
            }
            trace!("Instance starts clip {}", clip.name().unwrap_or("<unnamed>"));
            self.state = InstanceState::Animating;
        }
        self.last_time = time;

        let graph = self.model.graph();
        evaluate(clip, graph, time, self.playback, &mut self.pose);
        graph.global_matrices_into(self.pose.locals(), &mut self.globals);
        for (skin, output) in self.model.skins().iter().zip(self.joints.iter_mut()) {
            self.updater.update(skin, graph, self.pose.locals(), output);
        }
    }

    /// Joint matrices of skin `skin`, ready for upload.
    pub fn joint_matrices(&self, skin: usize) -> Option<&JointMatrices> {
        self.joints.get(skin)
    }

    pub fn all_joint_matrices(&self) -> &[JointMatrices] {
        &self.joints
    }

    pub fn local_matrices(&self) -> &[Mat4] {
        self.pose.locals()
    }

    /// Scene space transforms, for drawing unskinned meshes.
    pub fn global_matrices(&self) -> &[Mat4] {
        &self.globals
    }

    pub fn model_matrix(&self, params: &PlacementParams) -> Mat4 {
        self.placement.model_matrix(params)
    }
}
