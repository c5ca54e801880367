//! Error types for the scene core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by explicit scene requests and configuration I/O.
#[derive(Error, Debug)]
pub enum SceneError {
    // Configuration
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Unsupported config schema version {found}, expected at most {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("No config directory available on this platform")]
    NoConfigDir,

    // Interaction
    #[error("A photo is already in focus")]
    FocusBusy,

    #[error("Cinematic request rejected: {0}")]
    CinematicRejected(&'static str),

    #[error("Selection is disabled while the cinematic runs")]
    SelectionLocked,

    #[error("Unknown particle id {0}")]
    UnknownParticle(u32),

    #[error("Particle {0} cannot be focused")]
    NotFocusable(u32),
}

/// Hand tracker failures. These never escape the frame loop; they are logged
/// and turned into "no sample".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Tracking model failed to load: {0}")]
    Load(String),

    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Tracker has been torn down")]
    TornDown,
}

pub type SceneResult<T> = Result<T, SceneError>;
