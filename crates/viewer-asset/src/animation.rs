use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    /// Morph target weights. Loaded but never evaluated.
    Weights,
}

impl Display for AnimationPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AnimationPath::Translation => write!(f, "translation"),
            AnimationPath::Rotation => write!(f, "rotation"),
            AnimationPath::Scale => write!(f, "scale"),
            AnimationPath::Weights => write!(f, "weights"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Every keyframe carries (in-tangent, value, out-tangent).
    CubicSpline,
}

impl Interpolation {
    /// Number of stored values per keyframe.
    pub fn values_per_keyframe(&self) -> usize {
        match self {
            Interpolation::CubicSpline => 3,
            Interpolation::Step | Interpolation::Linear => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInterpolation(pub String);

impl Display for UnknownInterpolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown interpolation mode {}", self.0)
    }
}

impl Error for UnknownInterpolation {}

impl FromStr for Interpolation {
    type Err = UnknownInterpolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STEP" => Ok(Interpolation::Step),
            "LINEAR" => Ok(Interpolation::Linear),
            "CUBICSPLINE" => Ok(Interpolation::CubicSpline),
            other => Err(UnknownInterpolation(other.to_string())),
        }
    }
}

impl Display for Interpolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Step => write!(f, "STEP"),
            Interpolation::Linear => write!(f, "LINEAR"),
            Interpolation::CubicSpline => write!(f, "CUBICSPLINE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnimationValues {
    Vec3(Vec<[f32; 3]>),
    /// Quaternions stored as `[x, y, z, w]`.
    Quat(Vec<[f32; 4]>),
    Scalar(Vec<f32>),
}

impl AnimationValues {
    pub fn len(&self) -> usize {
        match self {
            AnimationValues::Vec3(values) => values.len(),
            AnimationValues::Quat(values) => values.len(),
            AnimationValues::Scalar(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnimationValues::Vec3(_) => "vec3",
            AnimationValues::Quat(_) => "quat",
            AnimationValues::Scalar(_) => "scalar",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationSamplerAsset {
    /// Keyframe times in seconds.
    pub times: Vec<f32>,
    pub values: AnimationValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationChannelAsset {
    pub target_node: usize,
    pub path: AnimationPath,
    /// Index into [`AnimationAsset::samplers`].
    pub sampler: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationAsset {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannelAsset>,
    pub samplers: Vec<AnimationSamplerAsset>,
}

#[cfg(test)]
mod test {
    use super::Interpolation;

    #[test]
    fn test_parse_interpolation() {
        assert_eq!("STEP".parse::<Interpolation>(), Ok(Interpolation::Step));
        assert_eq!("LINEAR".parse::<Interpolation>(), Ok(Interpolation::Linear));
        assert_eq!("CUBICSPLINE".parse::<Interpolation>(), Ok(Interpolation::CubicSpline));
        assert!("linear".parse::<Interpolation>().is_err());
        assert_eq!(Interpolation::CubicSpline.to_string(), "CUBICSPLINE");
    }
}
