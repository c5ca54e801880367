//! Photo focus transition.
//!
//! A focus session owns one progress scalar that eases toward 1 while open and
//! toward 0 once closing. Everything drawn for the focused photo (placement,
//! rotation, scale, opacities) is derived from that scalar each frame.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::camera_engine::CameraPose;
use crate::algorithm::easing::approach;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FocusConfig {
    pub lerp_factor: f32,
    pub close_epsilon: f32,
    /// Focus anchor in camera space.
    pub anchor_offset: Vec3,
    pub origin_scale: f32,
    pub focus_scale: f32,
    /// Tilt wobble (radians) of a scattered photo before it is pulled in.
    pub wobble: f32,
    pub backdrop_opacity: f32,
    pub border_opacity: f32,
    pub image_fade_gain: f32,
    pub caption_opacity: f32,
    pub max_width: f32,
    pub max_height: f32,
    pub fallback_size: f32,
    pub placeholder_color: String,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            lerp_factor: 0.12,
            close_epsilon: 0.005,
            anchor_offset: Vec3::new(0.0, 0.0, -6.0),
            origin_scale: 0.12,
            focus_scale: 1.0,
            wobble: 0.1,
            backdrop_opacity: 0.75,
            border_opacity: 0.4,
            image_fade_gain: 3.0,
            caption_opacity: 0.8,
            max_width: 3.2,
            max_height: 4.0,
            fallback_size: 3.1,
            placeholder_color: "#2b2b2b".to_string(),
        }
    }
}

/// State of the photo asset as reported by the external loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLoad {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

/// Plane size for the focused image, aspect preserved and clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFootprint {
    pub width: f32,
    pub height: f32,
    /// Set when the asset failed to load; the plane is filled with this color.
    pub placeholder_color: Option<String>,
}

impl ImageFootprint {
    pub fn from_load(load: &ImageLoad, config: &FocusConfig) -> Self {
        let square = Self {
            width: config.fallback_size,
            height: config.fallback_size,
            placeholder_color: None,
        };

        match load {
            ImageLoad::Pending => square,
            ImageLoad::Loaded { width, height } if *width > 0 && *height > 0 => {
                let aspect = *width as f32 / *height as f32;
                let mut plane_width = config.max_width;
                let mut plane_height = config.max_width / aspect;
                if plane_height > config.max_height {
                    plane_height = config.max_height;
                    plane_width = config.max_height * aspect;
                }
                Self {
                    width: plane_width,
                    height: plane_height,
                    placeholder_color: None,
                }
            }
            ImageLoad::Loaded { .. } | ImageLoad::Failed(_) => Self {
                placeholder_color: Some(config.placeholder_color.clone()),
                ..square
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusOpacities {
    pub backdrop: f32,
    pub border: f32,
    pub image: f32,
    pub caption: f32,
}

/// Everything the renderer needs to draw the focused photo this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusOverlay {
    pub session_id: Uuid,
    pub particle_id: u32,
    pub progress: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub opacities: FocusOpacities,
    pub footprint: ImageFootprint,
}

/// Per-frame inputs owned by other components.
#[derive(Debug, Clone, Copy)]
pub struct FocusFrame<'a> {
    /// Current scene position of the focused particle.
    pub origin: Vec3,
    pub exploded: bool,
    pub elapsed: f32,
    pub camera: &'a CameraPose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FocusUpdate {
    Overlay(FocusOverlay),
    /// Closing completed; reported exactly once per session.
    Finished,
    /// Session already finished.
    Idle,
}

#[derive(Debug, Clone)]
pub struct FocusSession {
    id: Uuid,
    particle_id: u32,
    config: FocusConfig,
    progress: f32,
    closing: bool,
    finished: bool,
    footprint: ImageFootprint,
}

impl FocusSession {
    pub fn open(particle_id: u32, config: FocusConfig) -> Self {
        let id = Uuid::new_v4();
        log::info!("focus_open: session={} particle={}", id, particle_id);
        let footprint = ImageFootprint::from_load(&ImageLoad::Pending, &config);
        Self {
            id,
            particle_id,
            config,
            progress: 0.0,
            closing: false,
            finished: false,
            footprint,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn particle_id(&self) -> u32 {
        self.particle_id
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn footprint(&self) -> &ImageFootprint {
        &self.footprint
    }

    pub fn request_close(&mut self) {
        if !self.closing {
            log::info!(
                "focus_close: session={} progress={:.3}",
                self.id,
                self.progress
            );
            self.closing = true;
        }
    }

    pub fn set_image(&mut self, load: &ImageLoad) {
        if let ImageLoad::Failed(reason) = load {
            log::warn!(
                "focus_image: session={} load failed, using placeholder: {}",
                self.id,
                reason
            );
        }
        self.footprint = ImageFootprint::from_load(load, &self.config);
    }

    pub fn update(&mut self, frame: &FocusFrame<'_>) -> FocusUpdate {
        if self.finished {
            return FocusUpdate::Idle;
        }

        let config = &self.config;
        let goal = if self.closing { 0.0 } else { 1.0 };
        self.progress = approach(self.progress, goal, config.lerp_factor);

        if self.closing && self.progress < config.close_epsilon {
            self.progress = 0.0;
            self.finished = true;
            log::info!("focus_finished: session={}", self.id);
            return FocusUpdate::Finished;
        }

        let p = self.progress;
        let anchor = frame.camera.camera_to_world(config.anchor_offset);
        let position = frame.origin.lerp(anchor, p);

        let yaw = frame.origin.x.atan2(frame.origin.z);
        let (tilt_x, tilt_z) = if frame.exploded {
            let seed = self.particle_id as f32;
            (
                (frame.elapsed * 0.4 + seed).sin() * config.wobble,
                (frame.elapsed * 0.5 + seed).cos() * config.wobble,
            )
        } else {
            (0.0, 0.0)
        };
        let origin_rotation = Quat::from_euler(EulerRot::XYZ, tilt_x, yaw, tilt_z);
        let rotation = origin_rotation.slerp(frame.camera.orientation(), p);

        let scale = config.origin_scale + (config.focus_scale - config.origin_scale) * p;

        FocusUpdate::Overlay(FocusOverlay {
            session_id: self.id,
            particle_id: self.particle_id,
            progress: p,
            position,
            rotation,
            scale,
            opacities: FocusOpacities {
                backdrop: p * config.backdrop_opacity,
                border: p * config.border_opacity,
                image: (p * config.image_fade_gain).min(1.0),
                caption: p * config.caption_opacity,
            },
            footprint: self.footprint.clone(),
        })
    }
}
