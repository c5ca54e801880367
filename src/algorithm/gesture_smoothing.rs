//! Signal smoothing for hand gestures.
//!
//! Every physical gesture test is noisy frame to frame, so each gesture keeps a
//! bounded counter that ramps up by `increment` while the test passes and down by
//! `decrement` while it fails. The gesture is stable once the counter exceeds
//! `threshold`. A stable gesture additionally survives `grace_ms` after its test
//! last passed, which covers short tracking dropouts.

use serde::{Deserialize, Serialize};

use crate::models::events::{CursorPos, HandLandmark, LandmarkFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterConfig {
    pub increment: u32,
    pub decrement: u32,
    pub max: u32,
    pub threshold: u32,
    pub grace_ms: u64,
}

impl CounterConfig {
    /// Consecutive passing frames needed to become stable from rest.
    pub fn frames_to_activate(&self) -> u32 {
        self.threshold / self.increment.max(1) + 1
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            increment: 1,
            decrement: 1,
            max: 8,
            threshold: 4,
            grace_ms: 0,
        }
    }
}

/// All tunables of the hand gesture pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    pub pointing: CounterConfig,
    pub pinch: CounterConfig,
    pub orbit: CounterConfig,
    /// Index tip to index base, in hand-scale units, above which the index counts as extended.
    pub pointing_extension_ratio: f32,
    /// Middle/ring/pinky tip to wrist, in hand-scale units, below which a finger counts as curled.
    pub pointing_curl_ratio: f32,
    /// Thumb tip to index tip, in hand-scale units, below which the select pinch holds.
    pub pinch_ratio: f32,
    /// Mean pairwise thumb/index/middle tip distance, in hand-scale units, for the orbit pinch.
    pub orbit_pinch_ratio: f32,
    pub spread_openness: f32,
    pub fist_openness: f32,
    /// Dead-zone frames needed before the same idle gesture can fire again.
    pub idle_rearm_frames: u32,
    pub orbit_warmup_ms: u64,
    /// Orbit deltas are not emitted across sample gaps longer than this.
    pub max_sample_gap_ms: u64,
    /// Webcam images are mirrored; flip the cursor horizontally.
    pub mirror_cursor: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pointing: CounterConfig {
                increment: 1,
                decrement: 2,
                max: 8,
                threshold: 4,
                grace_ms: 500,
            },
            pinch: CounterConfig {
                increment: 1,
                decrement: 1,
                max: 6,
                threshold: 3,
                grace_ms: 0,
            },
            orbit: CounterConfig {
                increment: 1,
                decrement: 1,
                max: 10,
                threshold: 5,
                grace_ms: 0,
            },
            pointing_extension_ratio: 0.85,
            pointing_curl_ratio: 1.35,
            pinch_ratio: 0.38,
            orbit_pinch_ratio: 0.9,
            spread_openness: 0.45,
            fist_openness: 0.28,
            idle_rearm_frames: 3,
            orbit_warmup_ms: 500,
            max_sample_gap_ms: 250,
            mirror_cursor: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Pointing,
    Pinch,
    Orbit,
}

/// Hysteresis counter plus grace window for one gesture.
#[derive(Debug, Clone)]
pub struct StableGesture {
    config: CounterConfig,
    counter: u32,
    last_seen_ms: Option<u64>,
    active: bool,
}

impl StableGesture {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            counter: 0,
            last_seen_ms: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Feeds one physical test result. Returns the edge when the stable state changes.
    pub fn observe(&mut self, passed: bool, now_ms: u64) -> Option<Edge> {
        if passed {
            self.counter = (self.counter + self.config.increment).min(self.config.max);
            self.last_seen_ms = Some(now_ms);
        } else {
            self.counter = self.counter.saturating_sub(self.config.decrement);
        }

        let next = self.counter > self.config.threshold || self.within_grace(now_ms);
        self.transition(next)
    }

    /// No sample this cycle: the gesture holds only while inside its grace window.
    pub fn expire(&mut self, now_ms: u64) -> Option<Edge> {
        if self.within_grace(now_ms) {
            return None;
        }
        self.counter = 0;
        self.transition(false)
    }

    pub fn force_off(&mut self) -> Option<Edge> {
        self.counter = 0;
        self.last_seen_ms = None;
        self.transition(false)
    }

    // Grace only extends a gesture that already became stable, so a single
    // passing frame can never activate it.
    fn within_grace(&self, now_ms: u64) -> bool {
        self.active
            && self
                .last_seen_ms
                .is_some_and(|seen| now_ms.saturating_sub(seen) < self.config.grace_ms)
    }

    fn transition(&mut self, next: bool) -> Option<Edge> {
        if next == self.active {
            return None;
        }
        self.active = next;
        Some(if next { Edge::Rising } else { Edge::Falling })
    }
}

/// Scale-normalized measurements of one landmark frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandGeometry {
    /// Wrist to index base distance.
    pub hand_scale: f32,
    pub index_extension: f32,
    /// Largest middle/ring/pinky tip-to-wrist ratio.
    pub curl_max: f32,
    pub pinch_ratio: f32,
    pub orbit_pinch_ratio: f32,
    /// Mean fingertip-to-wrist distance in image units.
    pub openness: f32,
    pub cursor: CursorPos,
    /// Orbit anchor (wrist) in image units.
    pub anchor: (f32, f32),
}

impl HandGeometry {
    pub fn from_frame(frame: &LandmarkFrame, mirror_cursor: bool) -> Option<Self> {
        if !frame.is_complete() {
            return None;
        }

        let wrist = frame.point(HandLandmark::Wrist);
        let thumb_tip = frame.point(HandLandmark::ThumbTip);
        let index_mcp = frame.point(HandLandmark::IndexMcp);
        let index_tip = frame.point(HandLandmark::IndexTip);
        let middle_tip = frame.point(HandLandmark::MiddleTip);
        let ring_tip = frame.point(HandLandmark::RingTip);
        let pinky_tip = frame.point(HandLandmark::PinkyTip);

        let hand_scale = wrist.distance(index_mcp);
        if !hand_scale.is_finite() || hand_scale < 1e-4 {
            return None;
        }

        let curl_max = [middle_tip, ring_tip, pinky_tip]
            .iter()
            .map(|tip| tip.distance(wrist) / hand_scale)
            .fold(0.0_f32, f32::max);

        let tri_pinch = (thumb_tip.distance(index_tip)
            + index_tip.distance(middle_tip)
            + thumb_tip.distance(middle_tip))
            / 3.0;

        let openness = [index_tip, middle_tip, ring_tip, pinky_tip]
            .iter()
            .map(|tip| tip.distance(wrist))
            .sum::<f32>()
            / 4.0;

        let cursor_x = if mirror_cursor {
            1.0 - index_tip.x
        } else {
            index_tip.x
        };

        Some(Self {
            hand_scale,
            index_extension: index_tip.distance(index_mcp) / hand_scale,
            curl_max,
            pinch_ratio: thumb_tip.distance(index_tip) / hand_scale,
            orbit_pinch_ratio: tri_pinch / hand_scale,
            openness,
            cursor: CursorPos {
                x: cursor_x.clamp(0.0, 1.0),
                y: index_tip.y.clamp(0.0, 1.0),
            },
            anchor: (wrist.x, wrist.y),
        })
    }

    pub fn is_pointing(&self, config: &GestureConfig) -> bool {
        self.index_extension > config.pointing_extension_ratio
            && self.curl_max < config.pointing_curl_ratio
    }

    pub fn is_select_pinching(&self, config: &GestureConfig) -> bool {
        self.pinch_ratio < config.pinch_ratio
    }

    pub fn is_orbit_pinching(&self, config: &GestureConfig) -> bool {
        self.orbit_pinch_ratio < config.orbit_pinch_ratio
    }
}

/// Owns the per-gesture stability state; persists across frames.
#[derive(Debug, Clone)]
pub struct GestureSmoother {
    pub(crate) pointing: StableGesture,
    pub(crate) pinch: StableGesture,
    pub(crate) orbit: StableGesture,
}

impl GestureSmoother {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            pointing: StableGesture::new(config.pointing),
            pinch: StableGesture::new(config.pinch),
            orbit: StableGesture::new(config.orbit),
        }
    }

    pub fn gesture(&self, kind: GestureKind) -> &StableGesture {
        match kind {
            GestureKind::Pointing => &self.pointing,
            GestureKind::Pinch => &self.pinch,
            GestureKind::Orbit => &self.orbit,
        }
    }

    pub fn gesture_mut(&mut self, kind: GestureKind) -> &mut StableGesture {
        match kind {
            GestureKind::Pointing => &mut self.pointing,
            GestureKind::Pinch => &mut self.pinch,
            GestureKind::Orbit => &mut self.orbit,
        }
    }

    pub fn is_active(&self, kind: GestureKind) -> bool {
        self.gesture(kind).is_active()
    }

    pub fn force_all_off(&mut self) -> Vec<(GestureKind, Edge)> {
        [GestureKind::Pointing, GestureKind::Pinch, GestureKind::Orbit]
            .into_iter()
            .filter_map(|kind| self.gesture_mut(kind).force_off().map(|edge| (kind, edge)))
            .collect()
    }
}
