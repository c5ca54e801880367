//! Easing curves shared by the camera reset and the cinematic choreography.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseInOutSine,
    #[default]
    EaseInOutCubic,
}

impl Easing {
    /// Maps `t` (clamped to 0..=1) onto the curve. Every curve fixes 0 and 1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOutSine => 0.5 - 0.5 * (std::f32::consts::PI * t).cos(),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Fraction of the way `t` is through `[start, end]`, clamped to 0..=1.
pub fn window_progress(t: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if t >= end { 1.0 } else { 0.0 };
    }
    ((t - start) / (end - start)).clamp(0.0, 1.0)
}

/// Frame-based exponential smoothing toward `target`.
pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_fix_endpoints_and_midpoint() {
        for easing in [Easing::Linear, Easing::EaseInOutSine, Easing::EaseInOutCubic] {
            assert!(easing.apply(0.0).abs() < 1e-6);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cubic_is_monotonic() {
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = Easing::EaseInOutCubic.apply(step as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn window_progress_clamps_outside_window() {
        assert_eq!(window_progress(0.05, 0.1, 0.9), 0.0);
        assert_eq!(window_progress(0.95, 0.1, 0.9), 1.0);
        assert!((window_progress(0.5, 0.1, 0.9) - 0.5).abs() < 1e-6);
    }
}
