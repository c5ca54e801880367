//! Scripted hand tracker used by the demo binary when no camera backend is wired.

use std::sync::Arc;

use crate::algorithm::hand_poses::{synthesize, HandPose};
use crate::capture::state::{HandTracker, LoadFuture, TrackerLoader};
use crate::error::TrackerError;
use crate::models::events::LandmarkFrame;

/// One step of the script: hold `pose` (or no hand) for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub pose: Option<HandPose>,
    pub duration_ms: u64,
    /// Hand drift per second in normalized image units.
    pub drift: (f32, f32),
}

impl ScriptStep {
    pub fn hold(pose: HandPose, duration_ms: u64) -> Self {
        Self {
            pose: Some(pose),
            duration_ms,
            drift: (0.0, 0.0),
        }
    }

    pub fn drag(pose: HandPose, duration_ms: u64, drift: (f32, f32)) -> Self {
        Self {
            pose: Some(pose),
            duration_ms,
            drift,
        }
    }

    pub fn absent(duration_ms: u64) -> Self {
        Self {
            pose: None,
            duration_ms,
            drift: (0.0, 0.0),
        }
    }
}

pub struct ScriptedTracker {
    script: Arc<Vec<ScriptStep>>,
    started_at_ms: Option<u64>,
}

impl ScriptedTracker {
    pub fn new(script: Arc<Vec<ScriptStep>>) -> Self {
        Self {
            script,
            started_at_ms: None,
        }
    }

    fn frame_at(&self, offset_ms: u64, now_ms: u64) -> Option<LandmarkFrame> {
        let total: u64 = self.script.iter().map(|step| step.duration_ms).sum();
        if total == 0 {
            return None;
        }
        let mut remaining = offset_ms % total;
        for step in self.script.iter() {
            if remaining < step.duration_ms {
                let secs = remaining as f32 / 1_000.0;
                let center = (0.5 + step.drift.0 * secs, 0.5 + step.drift.1 * secs);
                return step.pose.map(|pose| synthesize(pose, center, now_ms));
            }
            remaining -= step.duration_ms;
        }
        None
    }
}

impl HandTracker for ScriptedTracker {
    fn detect(&mut self, now_ms: u64) -> Result<Option<LandmarkFrame>, TrackerError> {
        let started_at_ms = *self.started_at_ms.get_or_insert(now_ms);
        Ok(self.frame_at(now_ms.saturating_sub(started_at_ms), now_ms))
    }

    fn close(&mut self) {
        log::debug!("scripted_tracker: closed");
    }
}

pub struct ScriptedLoader {
    script: Arc<Vec<ScriptStep>>,
}

impl ScriptedLoader {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script: Arc::new(script),
        }
    }
}

impl TrackerLoader for ScriptedLoader {
    fn load(&self) -> LoadFuture<'_> {
        let script = self.script.clone();
        Box::pin(async move {
            if script.is_empty() {
                return Err(TrackerError::Load("empty gesture script".to_string()));
            }
            Ok(Box::new(ScriptedTracker::new(script)) as Box<dyn HandTracker>)
        })
    }
}
