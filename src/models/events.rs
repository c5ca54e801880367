//! Input event schema: hand landmark frames, touch events and the per-frame
//! gesture output consumed by the scene.

use serde::{Deserialize, Serialize};

/// Number of keypoints in one tracked hand (MediaPipe hand landmarker order).
pub const LANDMARK_COUNT: usize = 21;

/// Named keypoints used by the gesture tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist,
    ThumbTip,
    IndexMcp,
    IndexTip,
    MiddleTip,
    RingTip,
    PinkyTip,
}

impl HandLandmark {
    /// Position of the keypoint inside a landmark frame.
    pub fn index(self) -> usize {
        match self {
            HandLandmark::Wrist => 0,
            HandLandmark::ThumbTip => 4,
            HandLandmark::IndexMcp => 5,
            HandLandmark::IndexTip => 8,
            HandLandmark::MiddleTip => 12,
            HandLandmark::RingTip => 16,
            HandLandmark::PinkyTip => 20,
        }
    }
}

/// One keypoint in normalized image coordinates (0.0–1.0, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance; depth is too noisy to be useful for the gesture tests.
    pub fn distance(self, other: LandmarkPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One detection cycle of a tracked hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkFrame {
    /// Milliseconds on the scene clock.
    pub ts: u64,
    pub points: Vec<LandmarkPoint>,
}

impl LandmarkFrame {
    /// Returns `None` when the tracker delivered a truncated frame.
    pub fn new(ts: u64, points: Vec<LandmarkPoint>) -> Option<Self> {
        if points.len() < LANDMARK_COUNT {
            return None;
        }
        Some(Self { ts, points })
    }

    pub fn point(&self, landmark: HandLandmark) -> LandmarkPoint {
        self.points
            .get(landmark.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= LANDMARK_COUNT
    }
}

/// A single touch contact in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Touch input delivered by the host surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TouchEvent {
    Start { ts: u64, touches: Vec<TouchPoint> },
    Move { ts: u64, touches: Vec<TouchPoint> },
    /// `touches` holds the contacts that are still down.
    End { ts: u64, touches: Vec<TouchPoint> },
    Cancel { ts: u64 },
}

impl TouchEvent {
    pub fn ts(&self) -> u64 {
        match self {
            TouchEvent::Start { ts, .. } => *ts,
            TouchEvent::Move { ts, .. } => *ts,
            TouchEvent::End { ts, .. } => *ts,
            TouchEvent::Cancel { ts } => *ts,
        }
    }
}

/// Edge-triggered gesture notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscreteGesture {
    Spread,
    Fist,
    SelectStart,
    SelectEnd,
}

/// Where a gesture frame came from; selection semantics differ per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputSource {
    #[default]
    Hand,
    Touch,
}

/// Active interaction mode after arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    #[default]
    Idle,
    Pointer,
    Orbit,
}

/// Screen-space cursor, normalized (0.0–1.0, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPos {
    pub x: f32,
    pub y: f32,
}

/// Normalized per-frame gesture output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureFrame {
    pub ts: u64,
    pub source: InputSource,
    pub hand_detected: bool,
    pub mode: InteractionMode,
    pub stable_pointing: bool,
    pub stable_pinching: bool,
    pub stable_orbiting: bool,
    /// True while orbit mode is active but still inside its warm-up delay.
    pub orbit_warming: bool,
    pub cursor_pos: Option<CursorPos>,
    /// Positional delta of the orbit anchor since the previous sample.
    pub orbit_delta: Option<(f32, f32)>,
    /// Set only on the frame where pointer mode is entered or left.
    pub pointer_toggle: Option<bool>,
    pub discrete_events: Vec<DiscreteGesture>,
}

impl GestureFrame {
    pub fn empty(ts: u64, source: InputSource) -> Self {
        Self {
            ts,
            source,
            ..Self::default()
        }
    }
}
