//! Gesture mode arbitration.
//!
//! Priority, evaluated top to bottom with short-circuit:
//! 1. pointer (focus select): drives the cursor and owns the nested select pinch;
//! 2. orbit control: emits anchor deltas after a warm-up delay;
//! 3. idle: one-shot spread / fist from the openness metric.

use crate::algorithm::gesture_smoothing::{
    Edge, GestureConfig, GestureKind, GestureSmoother, HandGeometry,
};
use crate::models::events::{
    DiscreteGesture, GestureFrame, InputSource, InteractionMode, LandmarkFrame,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArbiterMode {
    Idle,
    Pointer,
    Orbit {
        entered_at_ms: u64,
        last_anchor: Option<((f32, f32), u64)>,
    },
}

/// One-shot latch for the idle spread / fist gestures.
#[derive(Debug, Clone, Default)]
struct IdleLatch {
    last: Option<DiscreteGesture>,
    dead_zone_frames: u32,
}

impl IdleLatch {
    fn observe(&mut self, openness: f32, config: &GestureConfig) -> Option<DiscreteGesture> {
        let zone = if openness > config.spread_openness {
            Some(DiscreteGesture::Spread)
        } else if openness < config.fist_openness {
            Some(DiscreteGesture::Fist)
        } else {
            None
        };

        match zone {
            Some(gesture) => {
                self.dead_zone_frames = 0;
                if self.last == Some(gesture) {
                    return None;
                }
                self.last = Some(gesture);
                Some(gesture)
            }
            None => {
                self.dead_zone_frames = self.dead_zone_frames.saturating_add(1);
                if self.dead_zone_frames >= config.idle_rearm_frames {
                    self.last = None;
                }
                None
            }
        }
    }

    fn reset(&mut self) {
        self.last = None;
        self.dead_zone_frames = 0;
    }
}

/// Turns landmark frames (or their absence) into arbitrated gesture frames.
#[derive(Debug, Clone)]
pub struct GestureArbiter {
    config: GestureConfig,
    smoother: GestureSmoother,
    mode: ArbiterMode,
    idle: IdleLatch,
}

impl GestureArbiter {
    pub fn new(config: GestureConfig) -> Self {
        let smoother = GestureSmoother::new(&config);
        Self {
            config,
            smoother,
            mode: ArbiterMode::Idle,
            idle: IdleLatch::default(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn smoother(&self) -> &GestureSmoother {
        &self.smoother
    }

    pub fn mode(&self) -> InteractionMode {
        mode_of(&self.mode)
    }

    /// Processes one detection cycle. `None` means the tracker saw no hand.
    pub fn process(&mut self, now_ms: u64, frame: Option<&LandmarkFrame>) -> GestureFrame {
        let mut out = GestureFrame::empty(now_ms, InputSource::Hand);
        let geometry =
            frame.and_then(|frame| HandGeometry::from_frame(frame, self.config.mirror_cursor));

        match geometry {
            Some(geometry) => self.process_hand(now_ms, &geometry, &mut out),
            None => self.process_lost(now_ms, &mut out),
        }

        self.fill_flags(&mut out);
        out
    }

    /// Ends every gesture, e.g. when the interaction surface is torn down.
    pub fn reset(&mut self, now_ms: u64) -> GestureFrame {
        let mut out = GestureFrame::empty(now_ms, InputSource::Hand);
        for (kind, edge) in self.smoother.force_all_off() {
            self.apply_edge(kind, edge, &mut out);
        }
        self.mode = ArbiterMode::Idle;
        self.idle.reset();
        self.fill_flags(&mut out);
        out
    }

    fn process_hand(&mut self, now_ms: u64, geometry: &HandGeometry, out: &mut GestureFrame) {
        out.hand_detected = true;

        let pointing = geometry.is_pointing(&self.config);
        if let Some(edge) = self.smoother.pointing.observe(pointing, now_ms) {
            self.apply_edge(GestureKind::Pointing, edge, out);
        }

        if self.smoother.pointing.is_active() {
            if let Some(edge) = self.smoother.orbit.force_off() {
                self.apply_edge(GestureKind::Orbit, edge, out);
            }
            self.enter(ArbiterMode::Pointer);
            out.cursor_pos = Some(geometry.cursor);

            let pinching = geometry.is_select_pinching(&self.config);
            if let Some(edge) = self.smoother.pinch.observe(pinching, now_ms) {
                self.apply_edge(GestureKind::Pinch, edge, out);
            }
            return;
        }

        if let Some(edge) = self.smoother.pinch.force_off() {
            self.apply_edge(GestureKind::Pinch, edge, out);
        }

        let orbiting = geometry.is_orbit_pinching(&self.config);
        let orbit_edge = self.smoother.orbit.observe(orbiting, now_ms);
        if let Some(edge) = orbit_edge {
            self.apply_edge(GestureKind::Orbit, edge, out);
        }

        if self.smoother.orbit.is_active() {
            let (entered_at_ms, last_anchor) = match self.mode {
                ArbiterMode::Orbit {
                    entered_at_ms,
                    last_anchor,
                } if orbit_edge != Some(Edge::Rising) => (entered_at_ms, last_anchor),
                _ => (now_ms, None),
            };

            let warmed_up = now_ms.saturating_sub(entered_at_ms) > self.config.orbit_warmup_ms;
            let next_anchor = if warmed_up {
                if let Some((previous, previous_ts)) = last_anchor {
                    let fresh = now_ms >= previous_ts
                        && now_ms - previous_ts <= self.config.max_sample_gap_ms;
                    if fresh {
                        out.orbit_delta = Some((
                            geometry.anchor.0 - previous.0,
                            geometry.anchor.1 - previous.1,
                        ));
                    }
                }
                Some((geometry.anchor, now_ms))
            } else {
                out.orbit_warming = true;
                None
            };

            self.enter(ArbiterMode::Orbit {
                entered_at_ms,
                last_anchor: next_anchor,
            });
            return;
        }

        self.enter(ArbiterMode::Idle);
        if let Some(gesture) = self.idle.observe(geometry.openness, &self.config) {
            log::debug!("gesture_arbiter: idle gesture {gesture:?}");
            out.discrete_events.push(gesture);
        }
    }

    fn process_lost(&mut self, now_ms: u64, out: &mut GestureFrame) {
        out.hand_detected = false;
        self.idle.reset();

        if let Some(edge) = self.smoother.pointing.expire(now_ms) {
            self.apply_edge(GestureKind::Pointing, edge, out);
        }

        // The select pinch is nested in pointer mode and lives as long as it does.
        if self.smoother.pointing.is_active() {
            if let Some(edge) = self.smoother.orbit.force_off() {
                self.apply_edge(GestureKind::Orbit, edge, out);
            }
            self.enter(ArbiterMode::Pointer);
            return;
        }

        if let Some(edge) = self.smoother.pinch.force_off() {
            self.apply_edge(GestureKind::Pinch, edge, out);
        }
        if let Some(edge) = self.smoother.orbit.expire(now_ms) {
            self.apply_edge(GestureKind::Orbit, edge, out);
        }

        if self.smoother.orbit.is_active() {
            // Keep the entry time, drop the anchor so reacquisition cannot jump.
            if let ArbiterMode::Orbit { entered_at_ms, .. } = self.mode {
                self.mode = ArbiterMode::Orbit {
                    entered_at_ms,
                    last_anchor: None,
                };
            }
        } else {
            self.enter(ArbiterMode::Idle);
        }
    }

    fn enter(&mut self, next: ArbiterMode) {
        let changed = std::mem::discriminant(&self.mode) != std::mem::discriminant(&next);
        if changed {
            log::debug!("gesture_arbiter: {:?} -> {:?}", self.mode(), mode_of(&next));
            self.idle.reset();
        }
        self.mode = next;
    }

    fn apply_edge(&mut self, kind: GestureKind, edge: Edge, out: &mut GestureFrame) {
        match (kind, edge) {
            (GestureKind::Pointing, edge) => {
                out.pointer_toggle = Some(edge == Edge::Rising);
            }
            (GestureKind::Pinch, Edge::Rising) => {
                out.discrete_events.push(DiscreteGesture::SelectStart);
            }
            (GestureKind::Pinch, Edge::Falling) => {
                out.discrete_events.push(DiscreteGesture::SelectEnd);
            }
            (GestureKind::Orbit, _) => {}
        }
    }

    fn fill_flags(&self, out: &mut GestureFrame) {
        let pointing = self.smoother.pointing.is_active();
        out.stable_pointing = pointing;
        out.stable_pinching = pointing && self.smoother.pinch.is_active();
        out.stable_orbiting = !pointing && self.smoother.orbit.is_active();
        out.mode = self.mode();
    }
}

fn mode_of(mode: &ArbiterMode) -> InteractionMode {
    match mode {
        ArbiterMode::Idle => InteractionMode::Idle,
        ArbiterMode::Pointer => InteractionMode::Pointer,
        ArbiterMode::Orbit { .. } => InteractionMode::Orbit,
    }
}
