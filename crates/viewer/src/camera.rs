use glam::{Mat3, Mat4, Vec3};

use crate::params::CameraParams;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraProjection {
    pub aspect: f32,
    pub yfov: f32,
    pub znear: f32,
    pub zfar: Option<f32>,
}

impl CameraProjection {
    pub fn update_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn matrix(&self) -> Mat4 {
        if let Some(zfar) = self.zfar {
            Mat4::perspective_rh(self.yfov.to_radians(), self.aspect, self.znear, zfar)
        } else {
            Mat4::perspective_infinite_rh(self.yfov.to_radians(), self.aspect, self.znear)
        }
    }
}

/// Eye position and heading. The camera never pitches.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub yaw: f32,
}

impl CameraView {
    fn front_from_yaw(yaw: f32) -> Vec3 {
        let yaw = yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, yaw.sin())
    }

    pub fn front(&self) -> Vec3 {
        Self::front_from_yaw(self.yaw)
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// Point one unit in front of the eye.
    pub fn target(&self) -> Vec3 {
        self.eye + self.front()
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target(), Vec3::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    LookLeft,
    LookRight,
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Reset,
}

/// First-person camera driven by discrete actions.
#[derive(Debug, Clone)]
pub struct Camera {
    pub view: CameraView,
    pub projection: CameraProjection,
    params: CameraParams,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraParams::default())
    }
}

impl Camera {
    pub fn new(params: CameraParams) -> Self {
        Self {
            view: CameraView {
                eye: params.eye,
                yaw: params.yaw,
            },
            projection: CameraProjection {
                aspect: params.aspect,
                yfov: params.yfov,
                znear: params.znear,
                zfar: params.zfar,
            },
            params,
        }
    }

    pub fn apply(&mut self, action: CameraAction) {
        let step = self.params.speed;
        match action {
            CameraAction::LookLeft => self.view.yaw -= self.params.yaw_sensitivity,
            CameraAction::LookRight => self.view.yaw += self.params.yaw_sensitivity,
            CameraAction::MoveForward => self.view.eye += self.view.front() * step,
            CameraAction::MoveBackward => self.view.eye -= self.view.front() * step,
            CameraAction::MoveLeft => self.view.eye -= self.view.right() * step,
            CameraAction::MoveRight => self.view.eye += self.view.right() * step,
            CameraAction::Reset => {
                self.view.eye = self.params.eye;
                self.view.yaw = self.params.yaw;
            }
        }
    }

    pub fn update_aspect(&mut self, aspect: f32) {
        self.projection.update_aspect(aspect);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view.matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn matrix(&self) -> Mat4 {
        self.projection.matrix() * self.view.matrix()
    }

    /// View projection with the translation removed, for drawing a skybox
    /// that stays centered on the eye.
    pub fn skybox_view_projection(&self) -> Mat4 {
        let rotation = Mat4::from_mat3(Mat3::from_mat4(self.view.matrix()));
        self.projection.matrix() * rotation
    }
}
