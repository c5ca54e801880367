//! Scene configuration: loading and saving scene.json.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::algorithm::camera_engine::CameraConfig;
use crate::algorithm::cinematic::CinematicConfig;
use crate::algorithm::focus_transition::FocusConfig;
use crate::algorithm::gesture_smoothing::GestureConfig;
use crate::algorithm::particles::FormationConfig;
use crate::algorithm::subtitles::default_cues;
use crate::algorithm::touch_gestures::TouchConfig;
use crate::algorithm::velocity::VelocityConfig;
use crate::commands::audio::AudioPolicyConfig;
use crate::error::{SceneError, SceneResult};
use crate::models::scene::{DeviceClass, PopulationProfile, SubtitleCue, Track};

pub const SCHEMA_VERSION: u32 = 1;
const APP_DIR: &str = "festive-scene";
const CONFIG_FILE: &str = "scene.json";

/// Every tunable of the scene. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub schema_version: u32,
    pub device_class: DeviceClass,
    /// Overrides the device-class population when set.
    pub population: Option<PopulationProfile>,
    /// Fixed seed for scene generation; random when absent.
    pub seed: Option<u64>,
    pub photo_refs: Vec<String>,
    /// Pinch with nothing under the cursor focuses a random photo.
    pub random_pick_on_miss: bool,
    pub pick_radius: f32,
    pub viewport_aspect: f32,
    pub detection_interval_ms: u64,
    pub status_interval_ms: u64,
    pub gesture: GestureConfig,
    pub touch: TouchConfig,
    pub velocity: VelocityConfig,
    pub camera: CameraConfig,
    pub cinematic: CinematicConfig,
    pub formation: FormationConfig,
    pub focus: FocusConfig,
    pub subtitles: Vec<SubtitleCue>,
    pub playlist: Vec<Track>,
    pub audio: AudioPolicyConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            device_class: DeviceClass::Desktop,
            population: None,
            seed: None,
            photo_refs: Vec::new(),
            random_pick_on_miss: true,
            pick_radius: 0.65,
            viewport_aspect: 16.0 / 9.0,
            detection_interval_ms: 33,
            status_interval_ms: 100,
            gesture: GestureConfig::default(),
            touch: TouchConfig::default(),
            velocity: VelocityConfig::default(),
            camera: CameraConfig::default(),
            cinematic: CinematicConfig::default(),
            formation: FormationConfig::default(),
            focus: FocusConfig::default(),
            subtitles: default_cues(),
            playlist: default_playlist(),
            audio: AudioPolicyConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn population(&self) -> PopulationProfile {
        self.population
            .unwrap_or_else(|| PopulationProfile::for_class(self.device_class))
    }
}

pub fn default_playlist() -> Vec<Track> {
    [
        (1, "Saccharin", "/music/Saccharin.mp3"),
        (2, "Not Going Home", "/music/Not Going Home.mp3"),
        (3, "We Don't Talk Anymore", "/music/We Don't Talk Anymore.mp3"),
    ]
    .into_iter()
    .map(|(id, name, url)| Track {
        id,
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

/// Loads the scene config. A missing file yields the defaults.
///
/// `path` may point at the json file or at the directory containing it;
/// `None` uses `{config_dir}/festive-scene/scene.json`.
pub fn load_config(path: Option<&str>) -> SceneResult<SceneConfig> {
    let path = match path {
        Some(path) if !path.trim().is_empty() => resolve_config_file(path),
        _ => default_config_file()?,
    };

    if !path.exists() {
        log::info!("load_config: {} not found, using defaults", path.display());
        return Ok(SceneConfig::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| SceneError::ConfigIo {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&raw)?;
    log::info!(
        "load_config: path={} device={:?}",
        path.display(),
        config.device_class
    );
    Ok(config)
}

pub fn parse_config(raw: &str) -> SceneResult<SceneConfig> {
    let config: SceneConfig = serde_json::from_str(raw)?;
    if config.schema_version > SCHEMA_VERSION {
        return Err(SceneError::UnsupportedSchema {
            found: config.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(config)
}

/// Writes the config as pretty json and returns the path written.
pub fn save_config(config: &SceneConfig, path: Option<&str>) -> SceneResult<PathBuf> {
    let path = match path {
        Some(path) if !path.trim().is_empty() => resolve_config_file(path),
        _ => default_config_file()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SceneError::ConfigIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).map_err(|source| SceneError::ConfigIo {
        path: path.clone(),
        source,
    })?;

    log::info!("save_config: path={}", path.display());
    Ok(path)
}

fn resolve_config_file(path: &str) -> PathBuf {
    let input = PathBuf::from(path.trim());
    if input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        input
    } else {
        input.join(CONFIG_FILE)
    }
}

fn default_config_file() -> SceneResult<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or(SceneError::NoConfigDir)?;
    Ok(base.join(APP_DIR).join(Path::new(CONFIG_FILE)))
}
