//! Synthetic hand poses for the simulated tracker and for tests.
//!
//! Coordinates are normalized image units with the wrist 0.2 below `center` and
//! the index base 0.1 below it, giving a hand scale of 0.1.

use crate::models::events::{HandLandmark, LandmarkFrame, LandmarkPoint, LANDMARK_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPose {
    OpenPalm,
    Fist,
    /// Fingertips halfway out; openness sits between the fist and spread thresholds.
    Relaxed,
    Pointing,
    PointingPinch,
    OrbitPinch,
}

/// Builds a complete 21-point frame for `pose` centred on `center`.
pub fn synthesize(pose: HandPose, center: (f32, f32), ts: u64) -> LandmarkFrame {
    let (cx, cy) = center;
    let at = |dx: f32, dy: f32| LandmarkPoint::new(cx + dx, cy + dy);

    let wrist = at(0.0, 0.2);
    let index_mcp = at(0.0, 0.1);
    let (thumb, index, middle, ring, pinky) = match pose {
        HandPose::OpenPalm => (
            at(-0.15, 0.05),
            at(0.0, -0.35),
            at(0.05, -0.35),
            at(0.1, -0.3),
            at(0.15, -0.2),
        ),
        HandPose::Fist => (
            at(-0.14, 0.05),
            at(0.0, 0.12),
            at(0.02, 0.12),
            at(0.04, 0.13),
            at(0.06, 0.14),
        ),
        HandPose::Relaxed => (
            at(-0.12, 0.05),
            at(0.0, -0.15),
            at(0.04, -0.14),
            at(0.08, -0.12),
            at(0.12, -0.08),
        ),
        HandPose::Pointing => (
            at(-0.08, 0.1),
            at(0.0, -0.05),
            at(0.03, 0.12),
            at(0.05, 0.13),
            at(0.07, 0.14),
        ),
        HandPose::PointingPinch => (
            at(0.01, -0.03),
            at(0.0, -0.05),
            at(0.03, 0.12),
            at(0.05, 0.13),
            at(0.07, 0.14),
        ),
        HandPose::OrbitPinch => (
            at(-0.02, 0.01),
            at(0.0, 0.0),
            at(0.02, 0.0),
            at(0.04, 0.13),
            at(0.06, 0.14),
        ),
    };

    let mut points = vec![wrist; LANDMARK_COUNT];
    points[HandLandmark::ThumbTip.index()] = thumb;
    points[HandLandmark::IndexMcp.index()] = index_mcp;
    points[HandLandmark::IndexTip.index()] = index;
    points[HandLandmark::MiddleTip.index()] = middle;
    points[HandLandmark::RingTip.index()] = ring;
    points[HandLandmark::PinkyTip.index()] = pinky;

    LandmarkFrame { ts, points }
}
