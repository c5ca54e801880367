//! Velocity integrator: gesture deltas become decaying camera impulses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VelocityConfig {
    /// Applied to the horizontal delta; negative so dragging right spins left.
    pub rotation_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub rotation_decay: f32,
    pub zoom_decay: f32,
    /// Velocities at or below this magnitude are not applied and snap to zero.
    pub epsilon: f32,
    /// Auto-rotate stays off while `|rotation|` is at or above this.
    pub rotating_threshold: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            rotation_sensitivity: -1.8,
            zoom_sensitivity: 0.35,
            rotation_decay: 0.95,
            zoom_decay: 0.92,
            epsilon: 1e-4,
            rotating_threshold: 1e-3,
        }
    }
}

/// Camera step consumed for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraImpulse {
    /// Azimuth change in radians.
    pub rotation: f32,
    /// Positive dollies in, negative dollies out.
    pub zoom: f32,
}

impl CameraImpulse {
    pub fn is_zero(&self) -> bool {
        self.rotation == 0.0 && self.zoom == 0.0
    }
}

#[derive(Debug, Clone)]
pub struct VelocityIntegrator {
    config: VelocityConfig,
    rotation: f32,
    zoom: f32,
    locked: bool,
}

impl VelocityIntegrator {
    pub fn new(config: VelocityConfig) -> Self {
        Self {
            config,
            rotation: 0.0,
            zoom: 0.0,
            locked: false,
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Adds one gesture delta. Ignored while the camera is logically locked.
    pub fn accumulate(&mut self, dx: f32, dy: f32) -> bool {
        if self.locked || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.rotation += dx * self.config.rotation_sensitivity;
        self.zoom += dy * self.config.zoom_sensitivity;
        true
    }

    /// Locking discards residual velocity so control resumes without a jump.
    pub fn set_locked(&mut self, locked: bool) {
        if locked && !self.locked {
            self.reset();
        }
        self.locked = locked;
    }

    pub fn reset(&mut self) {
        self.rotation = 0.0;
        self.zoom = 0.0;
    }

    /// Consumes this frame's impulse, then decays both scalars.
    pub fn step(&mut self) -> CameraImpulse {
        let epsilon = self.config.epsilon;
        let impulse = CameraImpulse {
            rotation: if self.rotation.abs() > epsilon { self.rotation } else { 0.0 },
            zoom: if self.zoom.abs() > epsilon { self.zoom } else { 0.0 },
        };

        self.rotation = decay(self.rotation, self.config.rotation_decay, epsilon);
        self.zoom = decay(self.zoom, self.config.zoom_decay, epsilon);
        impulse
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.abs() >= self.config.rotating_threshold
    }

    /// Upper bound on frames until both scalars are at or below epsilon.
    pub fn frames_to_settle(&self) -> u32 {
        let epsilon = self.config.epsilon;
        let frames = |value: f32, factor: f32| -> u32 {
            if value.abs() <= epsilon || factor <= 0.0 {
                return 0;
            }
            if factor >= 1.0 {
                return u32::MAX;
            }
            ((epsilon / value.abs()).ln() / factor.ln()).ceil().max(0.0) as u32 + 1
        };
        frames(self.rotation, self.config.rotation_decay)
            .max(frames(self.zoom, self.config.zoom_decay))
    }
}

fn decay(value: f32, factor: f32, epsilon: f32) -> f32 {
    let next = value * factor;
    if next.abs() <= epsilon {
        0.0
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_scale_by_sensitivity() {
        let mut integrator = VelocityIntegrator::new(VelocityConfig::default());
        assert!(integrator.accumulate(0.1, 0.2));
        assert!((integrator.rotation() + 0.18).abs() < 1e-6);
        assert!((integrator.zoom() - 0.07).abs() < 1e-6);

        let impulse = integrator.step();
        assert!((impulse.rotation + 0.18).abs() < 1e-6);
        assert!((integrator.rotation() + 0.18 * 0.95).abs() < 1e-6);
        assert!((integrator.zoom() - 0.07 * 0.92).abs() < 1e-6);
    }

    #[test]
    fn velocity_settles_within_predicted_frames() {
        let mut integrator = VelocityIntegrator::new(VelocityConfig::default());
        integrator.accumulate(0.5, -0.5);
        let bound = integrator.frames_to_settle();
        assert!(bound > 0 && bound < 400);

        for _ in 0..bound {
            integrator.step();
        }
        assert_eq!(integrator.rotation(), 0.0);
        assert_eq!(integrator.zoom(), 0.0);
        assert!(integrator.step().is_zero());
    }

    #[test]
    fn locked_integrator_ignores_input_and_drops_residue() {
        let mut integrator = VelocityIntegrator::new(VelocityConfig::default());
        integrator.accumulate(0.3, 0.0);
        assert!(integrator.is_rotating());

        integrator.set_locked(true);
        assert_eq!(integrator.rotation(), 0.0);
        assert!(!integrator.accumulate(0.3, 0.3));
        assert!(!integrator.is_rotating());

        integrator.set_locked(false);
        assert!(integrator.accumulate(0.3, 0.0));
    }
}
