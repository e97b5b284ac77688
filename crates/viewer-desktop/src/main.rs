//! Headless frame loop over a skinned glTF model.
//!
//! There is no window, so the camera follows a fixed tour of actions instead
//! of keyboard input.
use std::{env, error::Error, process::ExitCode, sync::Arc, time::Duration};

use glam::Vec3;
use log::{debug, error, info, trace, warn};
use viewer::{
    asset::loader::gltf::load_gltf,
    camera::{Camera, CameraAction},
    instance::{Model, SkinnedInstance},
    params::ViewerParams,
};
use viewer_perf_tracker::{FrameTimer, PerformanceTracker, ReportInterval};

const DEFAULT_FRAMES: u32 = 600;
const FRAME_TIME_SAMPLES: usize = 120;
const CAMERA_TOUR_FRAMES: u32 = 30;
const CAMERA_TOUR: [CameraAction; 6] = [
    CameraAction::MoveForward,
    CameraAction::LookLeft,
    CameraAction::MoveLeft,
    CameraAction::LookRight,
    CameraAction::MoveBackward,
    CameraAction::Reset,
];

/// Camera action scheduled for `frame`, if any.
fn camera_tour_action(frame: u32) -> Option<CameraAction> {
    if frame % CAMERA_TOUR_FRAMES != 0 {
        return None;
    }
    let step = (frame / CAMERA_TOUR_FRAMES) as usize;
    Some(CAMERA_TOUR[step % CAMERA_TOUR.len()])
}

fn spawn_instances(model: &Arc<Model>, params: &ViewerParams) -> Vec<SkinnedInstance> {
    params
        .instances
        .iter()
        .map(|placement| {
            let mut instance = SkinnedInstance::new(model.clone(), *placement);
            instance.set_playback(params.playback);
            if let Some(name) = &params.clip {
                if !instance.set_clip_by_name(name) {
                    warn!("Model has no clip named {}, playing the first one", name);
                }
            }
            instance
        })
        .collect()
}

fn log_joints(instance: &SkinnedInstance) {
    for (index, joints) in instance.all_joint_matrices().iter().enumerate() {
        let Some(first) = joints.as_slice().first() else {
            continue;
        };
        info!(
            "Skin #{}: {} joints ({} bytes), first joint origin {}",
            index,
            joints.len(),
            joints.as_bytes().len(),
            first.transform_point3(Vec3::ZERO)
        );
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        return Err("usage: viewer-desktop <model.gltf|model.glb> [frames]".into());
    };
    let frames = match args.next() {
        Some(frames) => frames.parse::<u32>()?,
        None => DEFAULT_FRAMES,
    };
    let params = ViewerParams::default();

    let asset = load_gltf(&path)?;
    let model = Arc::new(Model::from_asset(&asset)?);
    info!(
        "Loaded {}: {} nodes, {} skins, {} clips",
        model.name().unwrap_or(path.as_str()),
        model.graph().len(),
        model.skins().len(),
        model.clips().len()
    );
    if let Some(clip) = model.clips().first() {
        info!(
            "First clip {} lasts {:.3}s",
            clip.name().unwrap_or("<unnamed>"),
            clip.duration()
        );
    }

    let mut instances = spawn_instances(&model, &params);
    let mut camera = Camera::new(params.camera.clone());

    let step = Duration::from_secs_f32(params.frame_step);
    let mut tracker = PerformanceTracker::new(FRAME_TIME_SAMPLES);
    let mut report = ReportInterval::new(Duration::from_secs_f32(params.fps_report_interval));
    let mut timer = FrameTimer::new();
    for frame in 0..frames {
        let time = frame as f32 * params.frame_step;
        if let Some(action) = camera_tour_action(frame) {
            camera.apply(action);
            debug!(
                "Camera {:?}: eye {}, yaw {:.1}",
                action, camera.view.eye, camera.view.yaw
            );
        }
        let view_projection = camera.matrix();
        let skybox = camera.skybox_view_projection();
        trace!("Skybox forward {}", skybox.project_point3(Vec3::NEG_Z));
        for instance in &mut instances {
            instance.update(time);
            let model_view_projection =
                view_projection * instance.model_matrix(&params.placement);
            debug!(
                "Instance at {} drawn with origin {}",
                instance.placement().position,
                model_view_projection.project_point3(Vec3::ZERO)
            );
        }
        tracker.add_sample(timer.tick());

        if report.advance(step) {
            info!(
                "Frame {} at {:.2}s: {:.1} FPS",
                frame,
                time,
                tracker.fps().unwrap_or(0.0)
            );
            if let Some(instance) = instances.first() {
                log_joints(instance);
            }
        }
    }
    info!("Rendered {} frames", tracker.frame_count());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use viewer::camera::{Camera, CameraAction};

    use super::{camera_tour_action, CAMERA_TOUR, CAMERA_TOUR_FRAMES};

    #[test]
    fn test_camera_tour_schedule() {
        assert_eq!(camera_tour_action(0), Some(CameraAction::MoveForward));
        assert_eq!(camera_tour_action(1), None);
        assert_eq!(camera_tour_action(CAMERA_TOUR_FRAMES), Some(CameraAction::LookLeft));
        let cycle = CAMERA_TOUR_FRAMES * CAMERA_TOUR.len() as u32;
        assert_eq!(camera_tour_action(cycle), Some(CameraAction::MoveForward));
    }

    #[test]
    fn test_camera_tour_returns_home() {
        let mut camera = Camera::default();
        let home = camera.view.clone();
        let cycle = CAMERA_TOUR_FRAMES * CAMERA_TOUR.len() as u32;
        let mut moved = false;
        for frame in 0..cycle {
            if let Some(action) = camera_tour_action(frame) {
                camera.apply(action);
                moved |= camera.view != home;
            }
        }
        assert!(moved);
        assert_eq!(camera.view, home);
    }
}
