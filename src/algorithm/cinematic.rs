//! Looping cinematic choreography.
//!
//! One cycle is two phases of equal length around a fixed look-at target:
//! - arc: overhead sweep, tilt `tilt_max * sin(pi * s)` while the azimuth turns
//!   a full circle, held still for `arc_hold` at both ends;
//! - push: vertical push from `overhead_height` down to `low_height` and back,
//!   holding at the top before and after the move, pausing at the bottom.
//!
//! Both phases start and end directly above the target at `overhead_height`,
//! which is what makes the wrap seamless.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::algorithm::easing::{window_progress, Easing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopPhase {
    Arc,
    Push,
}

impl LoopPhase {
    pub fn index(self) -> usize {
        match self {
            LoopPhase::Arc => 0,
            LoopPhase::Push => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CinematicConfig {
    pub target: Vec3,
    pub phase_secs: f32,
    pub overhead_height: f32,
    pub low_height: f32,
    /// Largest tilt away from vertical during the arc (radians).
    pub tilt_max: f32,
    /// Fraction of the arc phase held still at each end.
    pub arc_hold: f32,
    /// Push phase windows as fractions: top hold ends, descent ends, bottom
    /// pause ends, ascent ends. The rest is the closing top hold.
    pub push_windows: [f32; 4],
    pub easing: Easing,
    /// Frames used to blend from the frozen message pose into the loop.
    pub entry_frames: u32,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 7.5, 0.0),
            phase_secs: 12.0,
            overhead_height: 28.0,
            low_height: 11.0,
            tilt_max: 0.65,
            arc_hold: 0.1,
            push_windows: [0.12, 0.42, 0.58, 0.88],
            easing: Easing::EaseInOutCubic,
            entry_frames: 90,
        }
    }
}

/// Camera placement for one instant of the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CinematicSample {
    pub position: Vec3,
    pub target: Vec3,
    pub phase: LoopPhase,
    /// Fraction of the current phase, 0..1.
    pub phase_progress: f32,
}

#[derive(Debug, Clone)]
pub struct CinematicLoop {
    config: CinematicConfig,
    elapsed: f32,
}

impl CinematicLoop {
    pub fn new(config: CinematicConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
        }
    }

    pub fn config(&self) -> &CinematicConfig {
        &self.config
    }

    pub fn cycle_secs(&self) -> f32 {
        self.config.phase_secs.max(0.001) * 2.0
    }

    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn current(&self) -> CinematicSample {
        self.sample_at(self.elapsed)
    }

    pub fn advance(&mut self, dt: f32) -> CinematicSample {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt) % self.cycle_secs();
        }
        self.current()
    }

    /// Samples the loop at `time` seconds; any time is wrapped into one cycle.
    pub fn sample_at(&self, time: f32) -> CinematicSample {
        let phase_secs = self.config.phase_secs.max(0.001);
        let cycle = self.cycle_secs();
        let time = time.rem_euclid(cycle);

        let (phase, local) = if time < phase_secs {
            (LoopPhase::Arc, time / phase_secs)
        } else {
            (LoopPhase::Push, (time - phase_secs) / phase_secs)
        };
        let phase_progress = local.clamp(0.0, 1.0);

        let position = match phase {
            LoopPhase::Arc => self.arc_position(phase_progress),
            LoopPhase::Push => self.push_position(phase_progress),
        };

        CinematicSample {
            position,
            target: self.config.target,
            phase,
            phase_progress,
        }
    }

    pub fn arc_position(&self, t: f32) -> Vec3 {
        let config = &self.config;
        let hold = config.arc_hold.clamp(0.0, 0.49);
        let s = config.easing.apply(window_progress(t, hold, 1.0 - hold));

        let azimuth = TAU * s;
        let tilt = config.tilt_max * (PI * s).sin();
        let radius = config.overhead_height;

        config.target
            + Vec3::new(
                radius * tilt.sin() * azimuth.cos(),
                radius * tilt.cos(),
                radius * tilt.sin() * azimuth.sin(),
            )
    }

    pub fn push_position(&self, t: f32) -> Vec3 {
        let config = &self.config;
        let [top_end, descent_end, pause_end, ascent_end] = config.push_windows;
        let high = config.overhead_height;
        let low = config.low_height;

        let height = if t < top_end {
            high
        } else if t < descent_end {
            let s = config.easing.apply(window_progress(t, top_end, descent_end));
            high + (low - high) * s
        } else if t < pause_end {
            low
        } else if t < ascent_end {
            let s = config.easing.apply(window_progress(t, pause_end, ascent_end));
            low + (high - low) * s
        } else {
            high
        };

        config.target + Vec3::new(0.0, height, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn push_end_matches_arc_start_across_wrap() {
        let choreography = CinematicLoop::new(CinematicConfig::default());
        let cycle = choreography.cycle_secs();

        let end_of_cycle = choreography.push_position(1.0);
        let next_cycle = choreography.sample_at(cycle);
        assert_eq!(next_cycle.phase, LoopPhase::Arc);
        assert!(close(end_of_cycle, next_cycle.position));

        let just_before = choreography.sample_at(cycle - 1e-3);
        assert!(close(just_before.position, next_cycle.position));
    }

    #[test]
    fn phases_meet_at_their_boundary() {
        let choreography = CinematicLoop::new(CinematicConfig::default());
        assert!(close(
            choreography.arc_position(1.0),
            choreography.push_position(0.0)
        ));
    }

    #[test]
    fn arc_holds_still_at_both_ends() {
        let choreography = CinematicLoop::new(CinematicConfig::default());
        let start = choreography.arc_position(0.0);
        assert!(close(start, choreography.arc_position(0.05)));
        assert!(close(start, choreography.arc_position(0.95)));
        assert!(!close(start, choreography.arc_position(0.5)));
    }

    #[test]
    fn push_pauses_at_the_bottom() {
        let config = CinematicConfig::default();
        let choreography = CinematicLoop::new(config.clone());
        let bottom = choreography.push_position(0.5);
        assert!((bottom.y - (config.target.y + config.low_height)).abs() < 1e-4);
        assert!(close(bottom, choreography.push_position(0.45)));
        assert!(close(bottom, choreography.push_position(0.55)));
    }

    #[test]
    fn advance_wraps_elapsed_time() {
        let mut choreography = CinematicLoop::new(CinematicConfig::default());
        let cycle = choreography.cycle_secs();
        let sample = choreography.advance(cycle + 1.0);
        assert_eq!(sample.phase, LoopPhase::Arc);
        assert!((sample.phase_progress - 1.0 / 12.0).abs() < 1e-4);
    }
}
