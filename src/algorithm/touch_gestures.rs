//! Touch interpreter.
//!
//! Maps raw touch sequences onto the same `GestureFrame` shape the hand arbiter
//! produces: long press enters pointer mode, a single-finger drag orbits, and a
//! two-finger stretch emits spread / fist plus a zoom delta.

use serde::{Deserialize, Serialize};

use crate::models::events::{
    CursorPos, DiscreteGesture, GestureFrame, InputSource, InteractionMode, TouchEvent,
    TouchPoint,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TouchConfig {
    pub long_press_ms: u64,
    /// Per-move displacement (px) above which a press becomes a drag.
    pub drag_threshold_px: f32,
    pub drag_scale: f32,
    /// Total separation change (px) that triggers spread / fist.
    pub stretch_threshold_px: f32,
    pub zoom_scale: f32,
    /// Delay between the synthesized select start and select end.
    pub select_release_ms: u64,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            drag_threshold_px: 2.0,
            drag_scale: 0.5,
            stretch_threshold_px: 80.0,
            zoom_scale: 0.3,
            select_release_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchPhase {
    Idle,
    Pressing {
        started_at_ms: u64,
        last: (f32, f32),
    },
    Dragging {
        last: (f32, f32),
    },
    LongPress {
        last: (f32, f32),
    },
    TwoFinger {
        initial: f32,
        last: f32,
        latched: Option<DiscreteGesture>,
    },
}

#[derive(Debug, Clone)]
pub struct TouchGestureInterpreter {
    config: TouchConfig,
    viewport: (f32, f32),
    phase: TouchPhase,
    select_end_due_ms: Option<u64>,
}

impl TouchGestureInterpreter {
    pub fn new(config: TouchConfig) -> Self {
        Self {
            config,
            viewport: (1280.0, 720.0),
            phase: TouchPhase::Idle,
            select_end_due_ms: None,
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    pub fn is_pointing(&self) -> bool {
        matches!(self.phase, TouchPhase::LongPress { .. })
    }

    /// Consumes one touch event.
    pub fn handle(&mut self, event: &TouchEvent) -> GestureFrame {
        let now_ms = event.ts();
        let mut out = GestureFrame::empty(now_ms, InputSource::Touch);
        self.advance_timers(now_ms, &mut out);

        match event {
            TouchEvent::Start { touches, .. } => self.on_start(now_ms, touches, &mut out),
            TouchEvent::Move { touches, .. } => self.on_move(touches, &mut out),
            TouchEvent::End { touches, .. } => self.on_end(now_ms, touches, &mut out),
            TouchEvent::Cancel { .. } => {
                if self.is_pointing() {
                    out.pointer_toggle = Some(false);
                }
                self.phase = TouchPhase::Idle;
            }
        }

        self.fill_flags(&mut out);
        out
    }

    /// Timer-driven transitions: long-press promotion and the deferred select end.
    pub fn tick(&mut self, now_ms: u64) -> GestureFrame {
        let mut out = GestureFrame::empty(now_ms, InputSource::Touch);
        self.advance_timers(now_ms, &mut out);
        self.fill_flags(&mut out);
        out
    }

    pub fn reset(&mut self, now_ms: u64) -> GestureFrame {
        let mut out = GestureFrame::empty(now_ms, InputSource::Touch);
        if self.is_pointing() {
            out.pointer_toggle = Some(false);
        }
        if self.select_end_due_ms.take().is_some() {
            out.discrete_events.push(DiscreteGesture::SelectEnd);
        }
        self.phase = TouchPhase::Idle;
        self.fill_flags(&mut out);
        out
    }

    fn advance_timers(&mut self, now_ms: u64, out: &mut GestureFrame) {
        if let Some(due) = self.select_end_due_ms {
            if now_ms >= due {
                self.select_end_due_ms = None;
                out.discrete_events.push(DiscreteGesture::SelectEnd);
            }
        }

        if let TouchPhase::Pressing {
            started_at_ms,
            last,
        } = self.phase
        {
            if now_ms.saturating_sub(started_at_ms) >= self.config.long_press_ms {
                log::debug!("touch_gestures: long press at {last:?}");
                self.phase = TouchPhase::LongPress { last };
                out.pointer_toggle = Some(true);
                out.cursor_pos = Some(self.normalize(last));
            }
        }
    }

    fn on_start(&mut self, now_ms: u64, touches: &[TouchPoint], out: &mut GestureFrame) {
        match touches {
            [single] => {
                if !self.is_pointing() {
                    self.phase = TouchPhase::Pressing {
                        started_at_ms: now_ms,
                        last: (single.x, single.y),
                    };
                }
            }
            [first, second, ..] => {
                if self.is_pointing() {
                    out.pointer_toggle = Some(false);
                }
                let distance = separation(first, second);
                self.phase = TouchPhase::TwoFinger {
                    initial: distance,
                    last: distance,
                    latched: None,
                };
            }
            [] => {}
        }
    }

    fn on_move(&mut self, touches: &[TouchPoint], out: &mut GestureFrame) {
        match (touches, self.phase) {
            ([single], TouchPhase::LongPress { .. }) => {
                let point = (single.x, single.y);
                self.phase = TouchPhase::LongPress { last: point };
                out.cursor_pos = Some(self.normalize(point));
            }
            ([single], TouchPhase::Pressing { last, .. } | TouchPhase::Dragging { last }) => {
                let dx = single.x - last.0;
                let dy = single.y - last.1;
                let moved = dx.abs() > self.config.drag_threshold_px
                    || dy.abs() > self.config.drag_threshold_px;

                if moved {
                    out.orbit_delta = Some((
                        dx * self.config.drag_scale / self.viewport.0,
                        dy * self.config.drag_scale / self.viewport.1,
                    ));
                    self.phase = TouchPhase::Dragging {
                        last: (single.x, single.y),
                    };
                } else if let TouchPhase::Pressing { started_at_ms, .. } = self.phase {
                    self.phase = TouchPhase::Pressing {
                        started_at_ms,
                        last: (single.x, single.y),
                    };
                } else {
                    self.phase = TouchPhase::Dragging {
                        last: (single.x, single.y),
                    };
                }
            }
            (
                [first, second, ..],
                TouchPhase::TwoFinger {
                    initial,
                    last,
                    latched,
                },
            ) => {
                let distance = separation(first, second);
                let total = distance - initial;

                let zone = if total > self.config.stretch_threshold_px {
                    Some(DiscreteGesture::Spread)
                } else if total < -self.config.stretch_threshold_px {
                    Some(DiscreteGesture::Fist)
                } else {
                    None
                };
                let mut next_latch = latched;
                if let Some(gesture) = zone {
                    if latched != Some(gesture) {
                        out.discrete_events.push(gesture);
                        next_latch = Some(gesture);
                    }
                }

                out.orbit_delta = Some((
                    0.0,
                    (distance - last) * self.config.zoom_scale / self.viewport.1,
                ));
                self.phase = TouchPhase::TwoFinger {
                    initial,
                    last: distance,
                    latched: next_latch,
                };
            }
            _ => {}
        }
    }

    fn on_end(&mut self, now_ms: u64, remaining: &[TouchPoint], out: &mut GestureFrame) {
        if let TouchPhase::LongPress { last } = self.phase {
            out.cursor_pos = Some(self.normalize(last));
            out.discrete_events.push(DiscreteGesture::SelectStart);
            out.pointer_toggle = Some(false);
            self.select_end_due_ms = Some(now_ms + self.config.select_release_ms);
        }

        self.phase = match remaining {
            [] => TouchPhase::Idle,
            [single, ..] => TouchPhase::Dragging {
                last: (single.x, single.y),
            },
        };
    }

    fn normalize(&self, point: (f32, f32)) -> CursorPos {
        CursorPos {
            x: (point.0 / self.viewport.0).clamp(0.0, 1.0),
            y: (point.1 / self.viewport.1).clamp(0.0, 1.0),
        }
    }

    fn fill_flags(&self, out: &mut GestureFrame) {
        out.hand_detected = !matches!(self.phase, TouchPhase::Idle);
        out.stable_pointing = self.is_pointing();
        out.stable_orbiting = matches!(
            self.phase,
            TouchPhase::Dragging { .. } | TouchPhase::TwoFinger { .. }
        );
        out.mode = if out.stable_pointing {
            InteractionMode::Pointer
        } else if out.stable_orbiting {
            InteractionMode::Orbit
        } else {
            InteractionMode::Idle
        };
    }
}

fn separation(first: &TouchPoint, second: &TouchPoint) -> f32 {
    (second.x - first.x).hypot(second.y - first.y)
}
