use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Mul},
};

use glam::{Quat, Vec3};
use viewer_asset::animation::{AnimationSamplerAsset, AnimationValues, Interpolation};

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerError {
    Empty,
    NonFiniteTime(usize),
    NonIncreasingTime(usize),
    ValueCountMismatch(usize, usize),
    WrongValueKind(&'static str, &'static str),
}

impl Display for SamplerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SamplerError::Empty => write!(f, "Sampler has no keyframes"),
            SamplerError::NonFiniteTime(index) => {
                write!(f, "Keyframe #{} has a non-finite time", index)
            }
            SamplerError::NonIncreasingTime(index) => {
                write!(f, "Keyframe #{} is not after the previous keyframe", index)
            }
            SamplerError::ValueCountMismatch(expected, actual) => {
                write!(f, "Expected {} keyframe values, got {}", expected, actual)
            }
            SamplerError::WrongValueKind(expected, actual) => {
                write!(f, "Expected {} keyframe values, got {} values", expected, actual)
            }
        }
    }
}

impl Error for SamplerError {}

fn hermite<T>(vk: T, bk: T, vk_1: T, ak_1: T, t: f32, td: f32) -> T
where
    T: Mul<f32, Output = T> + Add<T, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    let first = vk * (2.0 * t3 - 3.0 * t2 + 1.0);
    let second = bk * (td * (t3 - 2.0 * t2 + t));
    let third = vk_1 * (-2.0 * t3 + 3.0 * t2);
    let forth = ak_1 * (td * (t3 - t2));
    first + second + third + forth
}

pub trait Interpolate: Copy + Debug {
    fn linear(a: Self, b: Self, t: f32) -> Self;
    /// Hermite spline between `vk` and `vk_1` with out-tangent `bk` and
    /// in-tangent `ak_1`, over an interval of `td` seconds.
    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        hermite(vk, bk, vk_1, ak_1, t, td)
    }
}

impl Interpolate for Quat {
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        hermite(vk, bk, vk_1, ak_1, t, td).normalize()
    }
}

/// Keyframe value types that can be read from an asset sampler.
pub trait KeyframeValue: Interpolate {
    const KIND: &'static str;

    fn from_values(values: &AnimationValues) -> Result<Vec<Self>, SamplerError>;
}

impl KeyframeValue for Vec3 {
    const KIND: &'static str = "vec3";

    fn from_values(values: &AnimationValues) -> Result<Vec<Self>, SamplerError> {
        match values {
            AnimationValues::Vec3(values) => Ok(values.iter().copied().map(Vec3::from).collect()),
            other => Err(SamplerError::WrongValueKind(Self::KIND, other.kind())),
        }
    }
}

impl KeyframeValue for Quat {
    const KIND: &'static str = "quat";

    fn from_values(values: &AnimationValues) -> Result<Vec<Self>, SamplerError> {
        match values {
            AnimationValues::Quat(values) => Ok(values
                .iter()
                .map(|value| Quat::from_array(*value).normalize())
                .collect()),
            other => Err(SamplerError::WrongValueKind(Self::KIND, other.kind())),
        }
    }
}

/// Find the keyframe interval containing `time`.
///
/// Returns `i` with `times[i] <= time < times[i + 1]`, or `times.len() - 2`
/// when no such interval exists. `times` must be strictly increasing.
pub fn find_keyframe(times: &[f32], time: f32) -> usize {
    let fallback = times.len().saturating_sub(2);
    let next = times.partition_point(|key| *key <= time);
    if next == 0 || next >= times.len() {
        fallback
    } else {
        next - 1
    }
}

/// Keyframe times and values of one animated property.
///
/// Cubic spline samplers store three values per keyframe: in-tangent,
/// value, out-tangent.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampler<T> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: Interpolation,
}

impl<T: KeyframeValue> Sampler<T> {
    pub fn new(
        times: Vec<f32>,
        values: Vec<T>,
        interpolation: Interpolation,
    ) -> Result<Self, SamplerError> {
        if times.is_empty() {
            return Err(SamplerError::Empty);
        }
        for (index, time) in times.iter().enumerate() {
            if !time.is_finite() {
                return Err(SamplerError::NonFiniteTime(index));
            }
            if index > 0 && *time <= times[index - 1] {
                return Err(SamplerError::NonIncreasingTime(index));
            }
        }
        let expected = times.len() * interpolation.values_per_keyframe();
        if values.len() != expected {
            return Err(SamplerError::ValueCountMismatch(expected, values.len()));
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    pub fn from_asset(asset: &AnimationSamplerAsset) -> Result<Self, SamplerError> {
        Self::new(
            asset.times.clone(),
            T::from_values(&asset.values)?,
            asset.interpolation,
        )
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Time of the last keyframe.
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// A single keyframe holds a static pose.
    pub fn is_static(&self) -> bool {
        self.times.len() < 2
    }

    fn value(&self, index: usize) -> T {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[index * 3 + 1],
            Interpolation::Step | Interpolation::Linear => self.values[index],
        }
    }

    fn in_tangent(&self, index: usize) -> T {
        self.values[index * 3]
    }

    fn out_tangent(&self, index: usize) -> T {
        self.values[index * 3 + 2]
    }

    /// Keyframe interval index and interpolation factor in `[0, 1]` for
    /// `time`, or `None` for a static sampler.
    pub fn interval(&self, time: f32) -> Option<(usize, f32)> {
        if self.is_static() {
            return None;
        }
        let index = find_keyframe(&self.times, time);
        let (t0, t1) = (self.times[index], self.times[index + 1]);
        let factor = ((time - t0) / (t1 - t0)).clamp(0.0, 1.0);
        Some((index, factor))
    }

    pub fn sample(&self, time: f32) -> T {
        let Some((index, factor)) = self.interval(time) else {
            return self.value(0);
        };

        let current = self.value(index);
        let next = self.value(index + 1);
        match self.interpolation {
            Interpolation::Step => next,
            _ if factor <= 0.0 => current,
            _ if factor >= 1.0 => next,
            Interpolation::Linear => T::linear(current, next, factor),
            Interpolation::CubicSpline => T::cubic_spline(
                current,
                self.out_tangent(index),
                next,
                self.in_tangent(index + 1),
                factor,
                self.times[index + 1] - self.times[index],
            ),
        }
    }
}
