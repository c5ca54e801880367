pub mod camera_engine;
pub mod cinematic;
pub mod easing;
pub mod focus_transition;
pub mod gesture_arbiter;
pub mod gesture_smoothing;
pub mod hand_poses;
pub mod particles;
pub mod picking;
pub mod scene_builder;
pub mod subtitles;
pub mod touch_gestures;
pub mod velocity;
