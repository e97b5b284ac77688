use glam::Vec3;

use crate::{animation::Playback, instance::Placement};

/// How a character model is placed into the world.
///
/// The model is translated to its position, scaled, lifted, stood upright
/// around X and finally turned to its heading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlacementParams {
    pub scale: f32,
    pub lift: Vec3,
    pub upright_degrees: f32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            scale: 0.025,
            lift: Vec3::new(0.0, 10.0, 0.0),
            upright_degrees: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CameraParams {
    pub eye: Vec3,
    /// Heading in degrees, measured from +X towards +Z.
    pub yaw: f32,
    /// Degrees turned per look action.
    pub yaw_sensitivity: f32,
    /// Distance moved per move action.
    pub speed: f32,
    pub yfov: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: Option<f32>,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 0.0),
            yaw: -90.0,
            yaw_sensitivity: 2.5,
            speed: 10.0,
            yfov: 90.0,
            aspect: 16.0 / 9.0,
            znear: 0.1,
            zfar: Some(1_000_000.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerParams {
    pub placement: PlacementParams,
    pub camera: CameraParams,
    pub playback: Playback,
    /// Clip played by every instance, by name. The first clip when unset.
    pub clip: Option<String>,
    pub instances: Vec<Placement>,
    /// Simulated seconds per frame.
    pub frame_step: f32,
    /// Seconds between two FPS reports.
    pub fps_report_interval: f32,
}

impl Default for ViewerParams {
    fn default() -> Self {
        let instances = [
            ((0.0, 0.0, 0.0), 0.0),
            ((100.0, 0.0, 100.0), 20.0),
            ((-100.0, 0.0, -100.0), -35.0),
            ((100.0, 0.0, -100.0), 44.0),
            ((31.0, 0.0, 89.0), 93.0),
            ((-44.0, 0.0, -74.0), -134.0),
        ]
        .into_iter()
        .map(|(position, angle)| Placement {
            position: position.into(),
            angle,
        })
        .collect();
        Self {
            placement: PlacementParams::default(),
            camera: CameraParams::default(),
            playback: Playback::default(),
            clip: None,
            instances,
            frame_step: 1.0 / 60.0,
            fps_report_interval: 2.0,
        }
    }
}
