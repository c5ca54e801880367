use std::f32::consts::PI;

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::algorithm::cinematic::{CinematicConfig, CinematicLoop, LoopPhase};
use crate::algorithm::easing::Easing;
use crate::algorithm::velocity::CameraImpulse;
use crate::error::{SceneError, SceneResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum CameraMode {
    Free,
    /// Photo focus: the camera ignores every driver.
    Locked,
    /// Frozen while the subtitle message plays.
    CinematicMessage,
    CinematicLooping {
        phase: LoopPhase,
        progress: f32,
    },
}

impl CameraMode {
    pub fn is_free(self) -> bool {
        matches!(self, CameraMode::Free)
    }

    pub fn is_cinematic(self) -> bool {
        matches!(
            self,
            CameraMode::CinematicMessage | CameraMode::CinematicLooping { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            target: self.target.lerp(other.target, t),
        }
    }

    /// Look-at rotation with the camera looking down its local -Z axis.
    pub fn orientation(&self) -> Quat {
        let forward = self.forward();
        if forward == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        // Straight up or down: world Y cannot serve as the up hint.
        let up_hint = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        };
        let right = forward.cross(up_hint).normalize();
        let up = right.cross(forward);
        Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
    }

    /// Point `offset` expressed in camera space, transformed to world space.
    pub fn camera_to_world(&self, offset: Vec3) -> Vec3 {
        self.position + self.orientation() * offset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub default_position: Vec3,
    pub default_target: Vec3,
    pub fov_deg: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Orbit-controls units: one turn per `60 / speed` seconds at 60 fps.
    pub auto_rotate_speed: f32,
    pub reset_frames: u32,
    pub reset_easing: Easing,
    /// Polar angle limits keep the orbit off the poles.
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_position: Vec3::new(0.0, 8.0, 30.0),
            default_target: Vec3::new(0.0, 7.5, 0.0),
            fov_deg: 45.0,
            min_distance: 8.0,
            max_distance: 80.0,
            auto_rotate_speed: 0.5,
            reset_frames: 60,
            reset_easing: Easing::EaseInOutCubic,
            min_polar: 0.01,
            max_polar: PI - 0.01,
        }
    }
}

impl CameraConfig {
    pub fn default_pose(&self) -> CameraPose {
        CameraPose::new(self.default_position, self.default_target)
    }

    pub fn auto_rotate_step(&self) -> f32 {
        2.0 * PI / 60.0 / 60.0 * self.auto_rotate_speed
    }
}

/// Eased blend from a captured pose toward a moving or fixed destination.
#[derive(Debug, Clone, Copy)]
struct PoseBlend {
    from: CameraPose,
    frame: u32,
    frames: u32,
}

impl PoseBlend {
    fn new(from: CameraPose, frames: u32) -> Self {
        Self {
            from,
            frame: 0,
            frames: frames.max(1),
        }
    }

    fn step(&mut self, destination: &CameraPose, easing: Easing) -> CameraPose {
        self.frame = (self.frame + 1).min(self.frames);
        let t = easing.apply(self.frame as f32 / self.frames as f32);
        self.from.lerp(destination, t)
    }

    fn is_done(&self) -> bool {
        self.frame >= self.frames
    }
}

/// Frame-driven input for one camera update.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraDrive {
    pub dt: f32,
    pub impulse: CameraImpulse,
    pub auto_rotate: bool,
}

#[derive(Debug, Clone)]
pub struct CameraEngine {
    config: CameraConfig,
    mode: CameraMode,
    pose: CameraPose,
    reset: Option<PoseBlend>,
    loop_entry: Option<PoseBlend>,
    choreography: CinematicLoop,
}

impl CameraEngine {
    pub fn new(config: CameraConfig, cinematic: CinematicConfig) -> Self {
        let pose = config.default_pose();
        Self {
            config,
            mode: CameraMode::Free,
            pose,
            reset: None,
            loop_entry: None,
            choreography: CinematicLoop::new(cinematic),
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn is_resetting(&self) -> bool {
        self.reset.is_some()
    }

    /// Orbit input only drives the camera in free mode once a reset has settled.
    pub fn accepts_input(&self) -> bool {
        self.mode.is_free() && self.reset.is_none()
    }

    /// Moves the camera directly, e.g. from an external orbit control.
    /// Ignored outside free mode or while a reset is still blending.
    pub fn set_pose(&mut self, pose: CameraPose) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.pose = pose;
        true
    }

    pub fn lock(&mut self) {
        if self.mode.is_free() {
            self.reset = None;
            self.set_mode(CameraMode::Locked);
        }
    }

    pub fn unlock(&mut self) {
        if self.mode == CameraMode::Locked {
            self.return_to_free();
        }
    }

    pub fn request_cinematic(&mut self, focus_active: bool) -> SceneResult<()> {
        if focus_active {
            return Err(SceneError::CinematicRejected("a photo is in focus"));
        }
        if !self.mode.is_free() {
            return Err(SceneError::CinematicRejected("camera is not free"));
        }
        self.reset = None;
        self.set_mode(CameraMode::CinematicMessage);
        Ok(())
    }

    /// The subtitle sequence completed: start looping.
    pub fn subtitles_finished(&mut self) {
        if self.mode != CameraMode::CinematicMessage {
            return;
        }
        self.choreography.restart();
        self.loop_entry = Some(PoseBlend::new(
            self.pose,
            self.choreography.config().entry_frames,
        ));
        let sample = self.choreography.current();
        self.set_mode(CameraMode::CinematicLooping {
            phase: sample.phase,
            progress: sample.phase_progress,
        });
    }

    pub fn stop_cinematic(&mut self) {
        if self.mode.is_cinematic() {
            self.return_to_free();
        }
    }

    pub fn update(&mut self, drive: CameraDrive) -> CameraPose {
        match self.mode {
            CameraMode::Free => self.update_free(drive),
            CameraMode::Locked | CameraMode::CinematicMessage => {}
            CameraMode::CinematicLooping { .. } => self.update_looping(drive.dt),
        }
        self.pose
    }

    fn update_free(&mut self, drive: CameraDrive) {
        if let Some(mut reset) = self.reset.take() {
            let destination = self.config.default_pose();
            self.pose = reset.step(&destination, self.config.reset_easing);
            if reset.is_done() {
                log::debug!("camera_reset: settled");
            } else {
                self.reset = Some(reset);
            }
            return;
        }

        let mut azimuth_delta = drive.impulse.rotation;
        if drive.auto_rotate {
            azimuth_delta -= self.config.auto_rotate_step();
        }
        self.pose = self.orbit(azimuth_delta, drive.impulse.zoom);
    }

    fn update_looping(&mut self, dt: f32) {
        let sample = self.choreography.advance(dt);
        let destination = CameraPose::new(sample.position, sample.target);

        self.pose = match self.loop_entry.take() {
            Some(mut entry) => {
                let pose = entry.step(&destination, Easing::EaseInOutSine);
                if !entry.is_done() {
                    self.loop_entry = Some(entry);
                }
                pose
            }
            None => destination,
        };
        self.mode = CameraMode::CinematicLooping {
            phase: sample.phase,
            progress: sample.phase_progress,
        };
    }

    fn orbit(&self, azimuth_delta: f32, zoom: f32) -> CameraPose {
        let offset = self.pose.position - self.pose.target;
        let radius = offset.length();
        if radius < 1e-6 {
            return self.pose;
        }

        let azimuth = offset.x.atan2(offset.z) + azimuth_delta;
        let polar = (offset.y / radius)
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(self.config.min_polar, self.config.max_polar);

        let mut distance = radius;
        if zoom > 0.0 {
            distance /= 1.0 + zoom;
        } else if zoom < 0.0 {
            distance *= 1.0 - zoom;
        }
        let distance = distance.clamp(self.config.min_distance, self.config.max_distance);

        let offset = Vec3::new(
            distance * polar.sin() * azimuth.sin(),
            distance * polar.cos(),
            distance * polar.sin() * azimuth.cos(),
        );
        CameraPose::new(self.pose.target + offset, self.pose.target)
    }

    fn return_to_free(&mut self) {
        self.loop_entry = None;
        self.reset = Some(PoseBlend::new(self.pose, self.config.reset_frames));
        self.set_mode(CameraMode::Free);
    }

    fn set_mode(&mut self, next: CameraMode) {
        if std::mem::discriminant(&self.mode) != std::mem::discriminant(&next) {
            log::info!("camera_mode: {:?} -> {:?}", self.mode, next);
        }
        self.mode = next;
    }
}
