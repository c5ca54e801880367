pub mod algorithm;
pub mod capture;
pub mod commands;
pub mod error;
pub mod models;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use algorithm::camera_engine::{CameraMode, CameraPose};
use algorithm::hand_poses::HandPose;
use capture::detection::{DetectionTask, SceneClock};
use capture::simulated::{ScriptStep, ScriptedLoader};
use capture::state::TrackerResource;
use commands::audio::{AudioCommand, AutoplayPolicy, PlayOutcome};
use commands::config::{load_config, SceneConfig};
use commands::scene::{SceneController, SceneEvent, SceneObserver};
use telemetry::status::StatusReporter;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const DEMO_FRAMES: u32 = 1_200;
const CINEMATIC_FRAME: u32 = 780;
const LOOP_FRAME: u32 = 1_000;

pub fn run() {
    env_logger::init();

    let config_path = std::env::args().nth(1);
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("run: {err}, falling back to defaults");
            SceneConfig::default()
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("run: failed to start runtime: {err}");
            return;
        }
    };
    runtime.block_on(run_scene(config));
}

/// Gesture script played by the simulated tracker.
fn demo_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::hold(HandPose::Relaxed, 600),
        ScriptStep::hold(HandPose::OpenPalm, 1_200),
        ScriptStep::hold(HandPose::Fist, 1_200),
        ScriptStep::hold(HandPose::Relaxed, 400),
        ScriptStep::drag(HandPose::OrbitPinch, 2_000, (0.08, 0.0)),
        ScriptStep::absent(800),
        ScriptStep::hold(HandPose::Pointing, 900),
        ScriptStep::hold(HandPose::PointingPinch, 700),
        ScriptStep::hold(HandPose::Pointing, 600),
        ScriptStep::absent(1_000),
    ]
}

async fn run_scene(config: SceneConfig) {
    let clock = SceneClock::start();
    let mut scene = SceneController::new(config.clone());
    let mut status = StatusReporter::new(config.status_interval_ms);
    let mut audio = AutoplayPolicy::new(config.playlist.clone(), config.audio.clone());
    let mut observer = LogObserver::default();

    let tracker = TrackerResource::new(Arc::new(ScriptedLoader::new(demo_script())));
    if let Err(err) = tracker.acquire().await {
        log::warn!("run_scene: hand control unavailable: {err}");
    }
    let mut detection = DetectionTask::spawn(
        tracker.clone(),
        clock,
        Duration::from_millis(config.detection_interval_ms),
        scene.population().detection_frame_skip,
    );

    // No interaction has happened yet, so the host rejects the first play.
    if let Some(AudioCommand::Play { track_id, .. }) = audio.mount() {
        audio.report(track_id, PlayOutcome::Blocked);
    }

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut last_ms = clock.now_ms();
    for index in 0..DEMO_FRAMES {
        ticker.tick().await;
        let now_ms = clock.now_ms();

        for sample in detection.drain() {
            scene.ingest_hand(&sample);
        }
        if let Some(snapshot) = status.observe(now_ms, tracker.status(), scene.last_gesture()) {
            log::trace!("run_scene: status {:?}", snapshot);
        }

        match index {
            CINEMATIC_FRAME => {
                if let Err(err) = scene.start_cinematic() {
                    log::warn!("run_scene: {err}");
                }
            }
            LOOP_FRAME => scene.subtitles_finished(),
            _ => {}
        }

        let dt = now_ms.saturating_sub(last_ms) as f32 / 1_000.0;
        last_ms = now_ms;
        scene.render_frame(now_ms, dt, &mut observer);

        if std::mem::take(&mut observer.interacted) {
            if let Some(AudioCommand::Play { track_id, url }) = audio.user_interacted() {
                log::info!("run_scene: playing {}", url);
                audio.report(track_id, PlayOutcome::Started);
            }
        }
    }

    detection.shutdown();
    scene.release_input(clock.now_ms());
    tracker.teardown().await;
    log::info!(
        "run_scene: done frames={} events={} camera={:?} music={}",
        observer.frames,
        observer.events,
        scene.camera().mode(),
        audio.is_playing()
    );
}

#[derive(Default)]
struct LogObserver {
    frames: u64,
    events: u64,
    interacted: bool,
}

impl SceneObserver for LogObserver {
    fn camera(&mut self, pose: &CameraPose, mode: CameraMode) {
        self.frames += 1;
        if self.frames % 120 == 0 {
            log::debug!(
                "scene_camera: mode={:?} position={:?} target={:?}",
                mode,
                pose.position,
                pose.target
            );
        }
    }

    fn event(&mut self, event: &SceneEvent) {
        self.events += 1;
        if matches!(event, SceneEvent::PointerToggle(true) | SceneEvent::Select(_)) {
            self.interacted = true;
        }
        log::info!("scene_event: {:?}", event);
    }
}
