//! Interaction status for the on-screen HUD.
//!
//! The HUD polls far less often than gestures change, so snapshots are
//! throttled. Every change of the underlying state is still logged at debug
//! level as it happens.

use serde::Serialize;

use crate::capture::state::TrackerStatus;
use crate::models::events::{GestureFrame, InteractionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub ts: u64,
    pub tracker: TrackerStatus,
    pub hand_detected: bool,
    pub mode: InteractionMode,
    pub orbit_warming: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            ts: 0,
            tracker: TrackerStatus::Uninitialized,
            hand_detected: false,
            mode: InteractionMode::Idle,
            orbit_warming: false,
        }
    }
}

impl StatusSnapshot {
    fn same_state(&self, other: &StatusSnapshot) -> bool {
        self.tracker == other.tracker
            && self.hand_detected == other.hand_detected
            && self.mode == other.mode
            && self.orbit_warming == other.orbit_warming
    }
}

#[derive(Debug, Clone)]
pub struct StatusReporter {
    interval_ms: u64,
    current: StatusSnapshot,
    last_published_ms: Option<u64>,
}

impl StatusReporter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            current: StatusSnapshot::default(),
            last_published_ms: None,
        }
    }

    pub fn current(&self) -> StatusSnapshot {
        self.current
    }

    /// Records the latest state. Returns a snapshot when one is due: at most
    /// one per interval.
    pub fn observe(
        &mut self,
        now_ms: u64,
        tracker: TrackerStatus,
        gesture: &GestureFrame,
    ) -> Option<StatusSnapshot> {
        let next = StatusSnapshot {
            ts: now_ms,
            tracker,
            hand_detected: gesture.hand_detected,
            mode: gesture.mode,
            orbit_warming: gesture.orbit_warming,
        };

        if !next.same_state(&self.current) {
            log::debug!(
                "interaction_status: tracker={:?} hand={} mode={:?} warming={}",
                next.tracker,
                next.hand_detected,
                next.mode,
                next.orbit_warming
            );
        }
        self.current = next;

        let due = match self.last_published_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_published_ms = Some(now_ms);
        Some(next)
    }
}
