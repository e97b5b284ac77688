use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::{Quat, Vec3};
use log::warn;
use viewer_asset::animation::{AnimationAsset, AnimationPath};

use crate::scene::{NodeId, SceneGraph};

pub mod evaluator;
pub mod sampler;

use sampler::{Sampler, SamplerError};

#[derive(Debug, Clone, PartialEq)]
pub enum ClipError {
    MissingSampler(usize, usize),
    BadSampler(usize, SamplerError),
}

impl Display for ClipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClipError::MissingSampler(channel, sampler) => write!(
                f,
                "Channel #{} refers to unknown sampler #{}",
                channel, sampler
            ),
            ClipError::BadSampler(channel, error) => {
                write!(f, "Bad sampler for channel #{}: {}", channel, error)
            }
        }
    }
}

impl Error for ClipError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClipError::BadSampler(_, error) => Some(error),
            ClipError::MissingSampler(_, _) => None,
        }
    }
}

/// How elapsed time maps onto the clip timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Playback {
    /// Wrap around at the end of the clip.
    #[default]
    Repeat,
    /// Play forwards, then backwards.
    PingPong,
    /// Hold the final pose after the end.
    Once,
}

impl Playback {
    pub fn clip_time(&self, elapsed: f32, duration: f32) -> f32 {
        if duration <= 0.0 || !elapsed.is_finite() {
            return 0.0;
        }
        match self {
            Playback::Repeat => wrap_time(elapsed, duration),
            Playback::PingPong => {
                let progress = elapsed.rem_euclid(2.0 * duration);
                if progress > duration {
                    2.0 * duration - progress
                } else {
                    progress
                }
            }
            Playback::Once => elapsed.clamp(0.0, duration),
        }
    }
}

/// `time` modulo `duration`, always in `[0, duration)`.
pub fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    let wrapped = time.rem_euclid(duration);
    // rem_euclid may round up to `duration` for tiny negative inputs.
    if wrapped >= duration {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelProperty {
    Translation(Sampler<Vec3>),
    Rotation(Sampler<Quat>),
    Scale(Sampler<Vec3>),
}

impl ChannelProperty {
    pub fn path(&self) -> AnimationPath {
        match self {
            ChannelProperty::Translation(_) => AnimationPath::Translation,
            ChannelProperty::Rotation(_) => AnimationPath::Rotation,
            ChannelProperty::Scale(_) => AnimationPath::Scale,
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            ChannelProperty::Translation(sampler) | ChannelProperty::Scale(sampler) => {
                sampler.duration()
            }
            ChannelProperty::Rotation(sampler) => sampler.duration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    target: NodeId,
    property: ChannelProperty,
}

impl Channel {
    pub fn new(target: NodeId, property: ChannelProperty) -> Self {
        Self { target, property }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn property(&self) -> &ChannelProperty {
        &self.property
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: Option<String>,
    channels: Vec<Channel>,
    duration: f32,
}

impl AnimationClip {
    pub fn new(name: Option<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .map(|channel| channel.property.duration())
            .fold(0.0, f32::max);
        Self {
            name,
            channels,
            duration,
        }
    }

    /// Build a clip for `graph`.
    ///
    /// Channels that target unknown nodes or unsupported properties are
    /// dropped with a warning. Malformed keyframe data fails the clip.
    pub fn from_asset(graph: &SceneGraph, asset: &AnimationAsset) -> Result<Self, ClipError> {
        let label = asset.name.as_deref().unwrap_or("<unnamed>");
        let mut channels = Vec::with_capacity(asset.channels.len());
        for (index, channel) in asset.channels.iter().enumerate() {
            let target = NodeId(channel.target_node);
            if !graph.contains(target) {
                warn!(
                    "Animation {}: channel #{} targets unknown node {}, skipped",
                    label, index, target
                );
                continue;
            }
            let sampler = asset
                .samplers
                .get(channel.sampler)
                .ok_or(ClipError::MissingSampler(index, channel.sampler))?;
            let property = match channel.path {
                AnimationPath::Translation => {
                    Sampler::from_asset(sampler).map(ChannelProperty::Translation)
                }
                AnimationPath::Rotation => {
                    Sampler::from_asset(sampler).map(ChannelProperty::Rotation)
                }
                AnimationPath::Scale => Sampler::from_asset(sampler).map(ChannelProperty::Scale),
                path => {
                    warn!(
                        "Animation {}: channel #{} animates unsupported property {}, skipped",
                        label, index, path
                    );
                    continue;
                }
            }
            .map_err(|error| ClipError::BadSampler(index, error))?;
            channels.push(Channel { target, property });
        }
        Ok(Self::new(asset.name.clone(), channels))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Time of the last keyframe over all channels.
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

#[cfg(test)]
pub(crate) mod test {
    use viewer_asset::animation::{
        AnimationAsset, AnimationChannelAsset, AnimationPath, AnimationSamplerAsset,
        AnimationValues, Interpolation,
    };

    use super::{wrap_time, AnimationClip, ClipError, Playback};
    use crate::{
        animation::sampler::{find_keyframe, SamplerError},
        scene::{test::chain_model, NodeId, SceneGraph},
    };

    /// Swings the arm around Z and moves the hand up over two seconds.
    pub(crate) fn wave_animation() -> AnimationAsset {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        AnimationAsset {
            name: Some("wave".to_string()),
            channels: vec![
                AnimationChannelAsset {
                    target_node: 1,
                    path: AnimationPath::Rotation,
                    sampler: 0,
                },
                AnimationChannelAsset {
                    target_node: 2,
                    path: AnimationPath::Translation,
                    sampler: 1,
                },
            ],
            samplers: vec![
                AnimationSamplerAsset {
                    times: vec![0.0, 1.0, 2.0],
                    values: AnimationValues::Quat(vec![
                        [0.0, 0.0, 0.0, 1.0],
                        [0.0, 0.0, half, half],
                        [0.0, 0.0, 0.0, 1.0],
                    ]),
                    interpolation: Interpolation::Linear,
                },
                AnimationSamplerAsset {
                    times: vec![0.0, 1.0],
                    values: AnimationValues::Vec3(vec![[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]),
                    interpolation: Interpolation::Linear,
                },
            ],
        }
    }

    #[test]
    fn test_clip_duration() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let clip = AnimationClip::from_asset(&graph, &wave_animation()).unwrap();
        assert_eq!(clip.name(), Some("wave"));
        assert_eq!(clip.channels().len(), 2);
        assert_eq!(clip.duration(), 2.0);
    }

    #[test]
    fn test_skip_unsupported_channels() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let mut animation = wave_animation();
        animation.channels.push(AnimationChannelAsset {
            target_node: 42,
            path: AnimationPath::Translation,
            sampler: 1,
        });
        animation.channels.push(AnimationChannelAsset {
            target_node: 0,
            path: AnimationPath::Weights,
            sampler: 1,
        });
        let clip = AnimationClip::from_asset(&graph, &animation).unwrap();
        assert_eq!(clip.channels().len(), 2);
        assert_eq!(clip.channels()[1].target(), NodeId(2));
    }

    #[test]
    fn test_reject_malformed_channels() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();

        let mut animation = wave_animation();
        animation.channels[1].sampler = 7;
        assert_eq!(
            AnimationClip::from_asset(&graph, &animation),
            Err(ClipError::MissingSampler(1, 7))
        );

        let mut animation = wave_animation();
        animation.channels[0].path = AnimationPath::Scale;
        assert_eq!(
            AnimationClip::from_asset(&graph, &animation),
            Err(ClipError::BadSampler(
                0,
                SamplerError::WrongValueKind("vec3", "quat")
            ))
        );
    }

    #[test]
    fn test_wrap_time() {
        assert_eq!(wrap_time(2.5, 2.0), 0.5);
        assert_eq!(wrap_time(2.0, 2.0), 0.0);
        assert_eq!(wrap_time(-0.5, 2.0), 1.5);
        assert_eq!(wrap_time(3.0, 0.0), 0.0);
        assert_eq!(find_keyframe(&[0.0, 1.0, 2.0], wrap_time(2.5, 2.0)), 0);
    }

    #[test]
    fn test_playback_modes() {
        assert_eq!(Playback::Repeat.clip_time(5.0, 2.0), 1.0);
        assert_eq!(Playback::PingPong.clip_time(1.5, 2.0), 1.5);
        assert_eq!(Playback::PingPong.clip_time(2.5, 2.0), 1.5);
        assert_eq!(Playback::PingPong.clip_time(4.5, 2.0), 0.5);
        assert_eq!(Playback::Once.clip_time(5.0, 2.0), 2.0);
        assert_eq!(Playback::Once.clip_time(-1.0, 2.0), 0.0);
        assert_eq!(Playback::Repeat.clip_time(f32::NAN, 2.0), 0.0);
    }
}
