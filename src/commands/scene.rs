//! Scene controller.
//!
//! Owns every interaction and animation component and wires them together
//! once per frame. Input arrives from two sides: detection samples and touch
//! events are folded into gesture frames as they come, and the host calls
//! [`SceneController::render_frame`] on every display frame. Precedence:
//! a focused photo suppresses idle gestures and orbit input; the cinematic
//! suppresses orbit input and selection.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::algorithm::camera_engine::{CameraDrive, CameraEngine, CameraMode, CameraPose};
use crate::algorithm::focus_transition::{
    FocusFrame, FocusOverlay, FocusSession, FocusUpdate, ImageLoad,
};
use crate::algorithm::gesture_arbiter::GestureArbiter;
use crate::algorithm::particles::{DustField, DustTransform, ParticleField, RenderBatch};
use crate::algorithm::picking::{pick_nearest, Ray};
use crate::algorithm::scene_builder::{assign_photos, generate_dust, generate_tree};
use crate::algorithm::subtitles::{SubtitleTrack, SubtitleUpdate};
use crate::algorithm::touch_gestures::TouchGestureInterpreter;
use crate::algorithm::velocity::VelocityIntegrator;
use crate::capture::detection::DetectionSample;
use crate::commands::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use crate::models::events::{
    CursorPos, DiscreteGesture, GestureFrame, InputSource, InteractionMode, TouchEvent,
};
use crate::models::scene::{DeviceClass, ParticleKind, PopulationProfile};

/// Discrete notifications for the UI outside the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SceneEvent {
    Explode,
    Assemble,
    Select(u32),
    Deselect,
    PointerToggle(bool),
    SubtitleChanged(Option<String>),
    CinematicStarted,
    CinematicLooping,
    CinematicStopped,
}

/// Render-side collaborator. Every method is optional.
pub trait SceneObserver {
    fn camera(&mut self, _pose: &CameraPose, _mode: CameraMode) {}
    fn particles(&mut self, _batches: &[RenderBatch]) {}
    fn dust(&mut self, _dust: &[DustTransform]) {}
    fn focus(&mut self, _overlay: &FocusOverlay) {}
    fn event(&mut self, _event: &SceneEvent) {}
}

pub struct SceneController {
    config: SceneConfig,
    rng: StdRng,
    arbiter: GestureArbiter,
    touch: TouchGestureInterpreter,
    velocity: VelocityIntegrator,
    camera: CameraEngine,
    particles: ParticleField,
    dust: DustField,
    focus: Option<FocusSession>,
    subtitles: SubtitleTrack,
    exploded: bool,
    elapsed: f32,
    cursor: Option<CursorPos>,
    last_hand_ts: Option<u64>,
    last_gesture: GestureFrame,
    pending: Vec<SceneEvent>,
}

impl SceneController {
    pub fn new(config: SceneConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let population = config.population();
        let particles = ParticleField::new(
            generate_tree(population.tree_count, &config.photo_refs, &mut rng),
            config.formation.clone(),
        );
        let dust = DustField::new(
            generate_dust(population.dust_count, &mut rng),
            config.formation.clone(),
        );

        log::info!(
            "scene_init: device={:?} tree={} dust={}",
            config.device_class,
            particles.len(),
            dust.len()
        );

        Self {
            arbiter: GestureArbiter::new(config.gesture.clone()),
            touch: TouchGestureInterpreter::new(config.touch.clone()),
            velocity: VelocityIntegrator::new(config.velocity.clone()),
            camera: CameraEngine::new(config.camera.clone(), config.cinematic.clone()),
            subtitles: SubtitleTrack::new(config.subtitles.clone()),
            particles,
            dust,
            focus: None,
            exploded: false,
            elapsed: 0.0,
            cursor: None,
            last_hand_ts: None,
            last_gesture: GestureFrame::default(),
            pending: Vec::new(),
            rng,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn population(&self) -> PopulationProfile {
        self.config.population()
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn camera(&self) -> &CameraEngine {
        &self.camera
    }

    pub fn velocity(&self) -> &VelocityIntegrator {
        &self.velocity
    }

    pub fn focus(&self) -> Option<&FocusSession> {
        self.focus.as_ref()
    }

    pub fn focused_particle(&self) -> Option<u32> {
        self.focus.as_ref().map(FocusSession::particle_id)
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }

    pub fn cursor(&self) -> Option<CursorPos> {
        self.cursor
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.last_gesture.mode
    }

    pub fn last_gesture(&self) -> &GestureFrame {
        &self.last_gesture
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.touch.set_viewport(width, height);
        self.config.viewport_aspect = width.max(1.0) / height.max(1.0);
    }

    /// Folds one detection sample into the gesture state. Samples older than
    /// the last one processed are dropped.
    pub fn ingest_hand(&mut self, sample: &DetectionSample) -> GestureFrame {
        if self.last_hand_ts.is_some_and(|last| sample.ts < last) {
            log::debug!("ingest_hand: dropping stale sample ts={}", sample.ts);
            return self.last_gesture.clone();
        }
        self.last_hand_ts = Some(sample.ts);

        let frame = self.arbiter.process(sample.ts, sample.frame.as_ref());
        self.apply_gesture(&frame);
        frame
    }

    pub fn ingest_touch(&mut self, event: &TouchEvent) -> GestureFrame {
        let frame = self.touch.handle(event);
        self.apply_gesture(&frame);
        frame
    }

    /// Ends every in-progress gesture, e.g. when hand control is switched off.
    pub fn release_input(&mut self, now_ms: u64) {
        let hand = self.arbiter.reset(now_ms);
        self.apply_gesture(&hand);
        let touch = self.touch.reset(now_ms);
        self.apply_gesture(&touch);
        self.cursor = None;
        self.last_hand_ts = None;
    }

    /// Advances every animation by one display frame and reports the result.
    pub fn render_frame(&mut self, now_ms: u64, dt: f32, observer: &mut dyn SceneObserver) {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        let touch = self.touch.tick(now_ms);
        if touch.pointer_toggle.is_some() || !touch.discrete_events.is_empty() {
            self.apply_gesture(&touch);
        }

        if self.camera.mode() == CameraMode::CinematicMessage {
            match self.subtitles.advance((dt * 1_000.0).round() as u64) {
                SubtitleUpdate::Unchanged => {}
                SubtitleUpdate::Changed(text) => self.pending.push(SceneEvent::SubtitleChanged(text)),
                SubtitleUpdate::Finished => self.enter_cinematic_loop(),
            }
        }

        let impulse = self.velocity.step();
        let auto_rotate = !self.exploded && self.focus.is_none() && !self.velocity.is_rotating();
        let pose = self.camera.update(CameraDrive {
            dt,
            impulse,
            auto_rotate,
        });

        let selected = self.focused_particle();
        self.particles.update(self.elapsed, self.exploded, selected);
        self.dust.update(self.exploded);

        let mut overlay = None;
        if let Some(session) = self.focus.as_mut() {
            let origin = self
                .particles
                .position_of(session.particle_id())
                .unwrap_or(pose.target);
            let frame = FocusFrame {
                origin,
                exploded: self.exploded,
                elapsed: self.elapsed,
                camera: &pose,
            };
            match session.update(&frame) {
                FocusUpdate::Overlay(next) => overlay = Some(next),
                FocusUpdate::Finished | FocusUpdate::Idle => self.release_focus(),
            }
        }

        for event in self.pending.drain(..) {
            observer.event(&event);
        }
        observer.camera(&pose, self.camera.mode());
        observer.particles(&self.particles.batches(selected));
        observer.dust(&self.dust.transforms(self.elapsed));
        if let Some(overlay) = overlay.as_ref() {
            observer.focus(overlay);
        }
    }

    pub fn set_exploded(&mut self, exploded: bool) {
        if self.exploded == exploded {
            return;
        }
        self.exploded = exploded;
        log::info!("scene_formation: exploded={}", exploded);
        self.pending.push(if exploded {
            SceneEvent::Explode
        } else {
            SceneEvent::Assemble
        });
    }

    pub fn toggle_exploded(&mut self) {
        self.set_exploded(!self.exploded);
    }

    /// Focuses a photo directly, e.g. from a mouse click.
    pub fn select_particle(&mut self, id: u32) -> SceneResult<()> {
        if self.camera.mode().is_cinematic() {
            return Err(SceneError::SelectionLocked);
        }
        if self.focus.is_some() {
            return Err(SceneError::FocusBusy);
        }
        let descriptor = self
            .particles
            .descriptor(id)
            .ok_or(SceneError::UnknownParticle(id))?;
        if !descriptor.kind.is_focusable() {
            return Err(SceneError::NotFocusable(id));
        }
        self.open_focus(id);
        Ok(())
    }

    /// Starts closing the focused photo. The session ends once the close
    /// transition completes.
    pub fn request_close_focus(&mut self) {
        if let Some(session) = self.focus.as_mut() {
            if !session.is_closing() {
                session.request_close();
                self.pending.push(SceneEvent::Deselect);
            }
        }
    }

    /// Applies a pose from the host's orbit controls. Returns false while the
    /// camera is locked, resetting or cinematic.
    pub fn set_camera_pose(&mut self, pose: CameraPose) -> bool {
        let applied = self.camera.set_pose(pose);
        if !applied {
            log::debug!("set_camera_pose: ignored in mode={:?}", self.camera.mode());
        }
        applied
    }

    /// Reports the outcome of the focused photo's image load.
    pub fn set_image_load(&mut self, particle_id: u32, load: &ImageLoad) {
        match self.focus.as_mut() {
            Some(session) if session.particle_id() == particle_id => session.set_image(load),
            _ => log::debug!("set_image_load: particle={} is not focused", particle_id),
        }
    }

    /// Swaps the photo references in rotation; positions are kept.
    pub fn replace_photos(&mut self, photo_refs: Vec<String>) -> usize {
        let mut descriptors = self.particles.descriptors().to_vec();
        let updated = assign_photos(&mut descriptors, &photo_refs);
        self.particles.replace_descriptors(descriptors);
        self.config.photo_refs = photo_refs;
        log::info!(
            "replace_photos: photos={} refs={}",
            updated,
            self.config.photo_refs.len()
        );
        updated
    }

    /// Switches the population profile and regenerates the particle set.
    pub fn set_device_class(&mut self, class: DeviceClass) -> PopulationProfile {
        if self.config.device_class == class {
            return self.population();
        }
        if let Some(session) = self.focus.as_ref() {
            if !session.is_closing() {
                self.pending.push(SceneEvent::Deselect);
            }
            self.release_focus();
        }

        self.config.device_class = class;
        let population = self.population();
        self.particles = ParticleField::new(
            generate_tree(population.tree_count, &self.config.photo_refs, &mut self.rng),
            self.config.formation.clone(),
        );
        self.dust = DustField::new(
            generate_dust(population.dust_count, &mut self.rng),
            self.config.formation.clone(),
        );
        log::info!(
            "set_device_class: class={:?} tree={} dust={}",
            class,
            population.tree_count,
            population.dust_count
        );
        population
    }

    pub fn start_cinematic(&mut self) -> SceneResult<()> {
        self.camera.request_cinematic(self.focus.is_some())?;
        self.velocity.set_locked(true);
        self.subtitles.start();
        log::info!(
            "cinematic_start: message duration={}ms",
            self.subtitles.duration_ms()
        );
        self.pending.push(SceneEvent::CinematicStarted);
        Ok(())
    }

    /// External signal that the subtitle message has completed.
    pub fn subtitles_finished(&mut self) {
        if self.camera.mode() == CameraMode::CinematicMessage {
            self.enter_cinematic_loop();
        }
    }

    pub fn stop_cinematic(&mut self) {
        if !self.camera.mode().is_cinematic() {
            return;
        }
        if self.subtitles.current_text().is_some() {
            self.pending.push(SceneEvent::SubtitleChanged(None));
        }
        self.subtitles.stop();
        self.camera.stop_cinematic();
        self.velocity.set_locked(false);
        log::info!("cinematic_stop: returning to free camera");
        self.pending.push(SceneEvent::CinematicStopped);
    }

    fn enter_cinematic_loop(&mut self) {
        self.subtitles.stop();
        self.camera.subtitles_finished();
        log::info!("cinematic_loop: started");
        self.pending.push(SceneEvent::CinematicLooping);
    }

    fn apply_gesture(&mut self, frame: &GestureFrame) {
        if frame.cursor_pos.is_some() {
            self.cursor = frame.cursor_pos;
        }

        if let Some((dx, dy)) = frame.orbit_delta {
            if self.focus.is_none() && self.camera.accepts_input() {
                self.velocity.accumulate(dx, dy);
            }
        }

        // A release selects at the last cursor before pointer mode ends.
        for &gesture in &frame.discrete_events {
            self.apply_discrete(gesture, frame.source);
        }

        if let Some(active) = frame.pointer_toggle {
            self.pending.push(SceneEvent::PointerToggle(active));
            if !active {
                self.cursor = None;
            }
        }

        self.last_gesture = frame.clone();
    }

    fn apply_discrete(&mut self, gesture: DiscreteGesture, source: InputSource) {
        match gesture {
            DiscreteGesture::Spread | DiscreteGesture::Fist => {
                if self.focus.is_some() {
                    log::debug!("scene_gesture: {:?} ignored while focused", gesture);
                    return;
                }
                self.set_exploded(gesture == DiscreteGesture::Spread);
            }
            DiscreteGesture::SelectStart => {
                if self.camera.mode().is_cinematic() {
                    log::debug!("scene_gesture: select ignored during cinematic");
                    return;
                }
                match (self.focus.is_some(), source) {
                    (true, InputSource::Touch) => self.request_close_focus(),
                    (true, InputSource::Hand) => {}
                    (false, _) => {
                        if let Some(id) = self.pick() {
                            self.open_focus(id);
                        }
                    }
                }
            }
            DiscreteGesture::SelectEnd => {
                if source == InputSource::Hand {
                    self.request_close_focus();
                }
            }
        }
    }

    /// Photo under the cursor, or a random photo when nothing is hovered.
    fn pick(&mut self) -> Option<u32> {
        let photos: Vec<(u32, Vec3)> = self
            .particles
            .descriptors()
            .iter()
            .filter(|descriptor| descriptor.kind == ParticleKind::Photo)
            .filter_map(|descriptor| {
                self.particles
                    .position_of(descriptor.id)
                    .map(|position| (descriptor.id, position))
            })
            .collect();

        if let Some(cursor) = self.cursor {
            let ray = Ray::from_cursor(
                &self.camera.pose(),
                cursor,
                self.camera.config().fov_deg,
                self.config.viewport_aspect,
            );
            if let Some(id) = pick_nearest(&ray, photos.iter().copied(), self.config.pick_radius) {
                return Some(id);
            }
        }

        if !self.config.random_pick_on_miss {
            return None;
        }
        let id = photos.choose(&mut self.rng).map(|(id, _)| *id);
        if let Some(id) = id {
            log::debug!("scene_pick: nothing hovered, random photo={}", id);
        }
        id
    }

    fn open_focus(&mut self, id: u32) {
        self.focus = Some(FocusSession::open(id, self.config.focus.clone()));
        self.camera.lock();
        self.velocity.set_locked(true);
        self.pending.push(SceneEvent::Select(id));
    }

    fn release_focus(&mut self) {
        self.focus = None;
        self.camera.unlock();
        if !self.camera.mode().is_cinematic() {
            self.velocity.set_locked(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::focus_transition::ImageFootprint;
    use crate::algorithm::hand_poses::{synthesize, HandPose};
    use crate::models::events::TouchPoint;

    #[derive(Default)]
    struct Recorder {
        events: Vec<SceneEvent>,
        overlays: usize,
        batches: usize,
        modes: Vec<CameraMode>,
    }

    impl SceneObserver for Recorder {
        fn camera(&mut self, _pose: &CameraPose, mode: CameraMode) {
            self.modes.push(mode);
        }

        fn particles(&mut self, batches: &[RenderBatch]) {
            self.batches = batches.len();
        }

        fn focus(&mut self, _overlay: &FocusOverlay) {
            self.overlays += 1;
        }

        fn event(&mut self, event: &SceneEvent) {
            self.events.push(event.clone());
        }
    }

    impl Recorder {
        fn count(&self, event: &SceneEvent) -> usize {
            self.events.iter().filter(|seen| *seen == event).count()
        }
    }

    fn controller() -> SceneController {
        let config = SceneConfig {
            seed: Some(7),
            population: Some(PopulationProfile {
                tree_count: 300,
                dust_count: 20,
                detection_frame_skip: 1,
            }),
            ..SceneConfig::default()
        };
        SceneController::new(config)
    }

    fn first_of(controller: &SceneController, kind: ParticleKind) -> u32 {
        controller
            .particles()
            .descriptors()
            .iter()
            .find(|descriptor| descriptor.kind == kind)
            .map(|descriptor| descriptor.id)
            .expect("particle of requested kind")
    }

    fn gesture(source: InputSource, events: &[DiscreteGesture]) -> GestureFrame {
        GestureFrame {
            cursor_pos: Some(CursorPos { x: 0.5, y: 0.5 }),
            discrete_events: events.to_vec(),
            ..GestureFrame::empty(0, source)
        }
    }

    fn photos(controller: &SceneController) -> Vec<(u32, Vec3)> {
        controller
            .particles()
            .descriptors()
            .iter()
            .filter(|descriptor| descriptor.kind == ParticleKind::Photo)
            .filter_map(|descriptor| {
                controller
                    .particles()
                    .position_of(descriptor.id)
                    .map(|position| (descriptor.id, position))
            })
            .collect()
    }

    /// Screen position of a world point for the current camera, y down.
    fn project(controller: &SceneController, point: Vec3) -> Option<CursorPos> {
        let pose = controller.camera().pose();
        let local = pose.orientation().inverse() * (point - pose.position);
        if local.z > -1e-3 {
            return None;
        }
        let half_height = (controller.camera().config().fov_deg.to_radians() * 0.5).tan();
        let ndc_x = local.x / (-local.z * half_height * controller.config().viewport_aspect);
        let ndc_y = local.y / (-local.z * half_height);
        Some(CursorPos {
            x: (ndc_x + 1.0) * 0.5,
            y: (1.0 - ndc_y) * 0.5,
        })
    }

    /// A photo that is the nearest hit under its own screen position.
    fn hovered_photo(controller: &SceneController) -> (u32, CursorPos) {
        let photos = photos(controller);
        let pose = controller.camera().pose();
        photos
            .iter()
            .filter_map(|&(id, position)| project(controller, position).map(|cursor| (id, cursor)))
            .filter(|(_, cursor)| {
                (0.15..0.85).contains(&cursor.x) && (0.15..0.85).contains(&cursor.y)
            })
            .find(|&(id, cursor)| {
                let ray = Ray::from_cursor(
                    &pose,
                    cursor,
                    controller.camera().config().fov_deg,
                    controller.config().viewport_aspect,
                );
                let radius = controller.config().pick_radius;
                pick_nearest(&ray, photos.iter().copied(), radius) == Some(id)
            })
            .expect("unobstructed photo on screen")
    }

    fn strict_controller() -> SceneController {
        let mut scene = controller();
        scene.config.random_pick_on_miss = false;
        scene
    }

    fn hand_at(
        controller: &mut SceneController,
        pose: HandPose,
        cursor: CursorPos,
        ts: u64,
    ) -> GestureFrame {
        // Index tip sits 0.05 above the pose center; the cursor is mirrored.
        let center = (1.0 - cursor.x, cursor.y + 0.05);
        controller.ingest_hand(&DetectionSample {
            ts,
            frame: Some(synthesize(pose, center, ts)),
        })
    }

    fn run_frames(controller: &mut SceneController, recorder: &mut Recorder, frames: u32, dt: f32) {
        for frame in 0..frames {
            let now_ms = (frame as f32 * dt * 1_000.0) as u64;
            controller.render_frame(now_ms, dt, recorder);
        }
    }

    #[test]
    fn idle_gestures_drive_formation_unless_focused() {
        let mut scene = controller();
        let mut recorder = Recorder::default();

        scene.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::Spread]));
        assert!(scene.is_exploded());
        scene.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::Fist]));
        assert!(!scene.is_exploded());

        let photo = first_of(&scene, ParticleKind::Photo);
        scene.select_particle(photo).expect("select photo");
        scene.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::Spread]));
        assert!(!scene.is_exploded());

        run_frames(&mut scene, &mut recorder, 1, 1.0 / 60.0);
        assert_eq!(recorder.count(&SceneEvent::Explode), 1);
        assert_eq!(recorder.count(&SceneEvent::Assemble), 1);
        assert_eq!(recorder.count(&SceneEvent::Select(photo)), 1);
        assert_eq!(recorder.batches, ParticleKind::ALL.len());
    }

    #[test]
    fn direct_selection_is_validated() {
        let mut scene = controller();
        let leaf = first_of(&scene, ParticleKind::Leaf);
        let photo = first_of(&scene, ParticleKind::Photo);

        assert!(matches!(
            scene.select_particle(99_999),
            Err(SceneError::UnknownParticle(99_999))
        ));
        assert!(matches!(
            scene.select_particle(leaf),
            Err(SceneError::NotFocusable(id)) if id == leaf
        ));

        scene.select_particle(photo).expect("select photo");
        assert_eq!(scene.focused_particle(), Some(photo));
        assert_eq!(scene.camera().mode(), CameraMode::Locked);
        assert!(scene.velocity().is_locked());
        assert!(matches!(scene.select_particle(photo), Err(SceneError::FocusBusy)));
    }

    #[test]
    fn focus_closes_once_and_camera_resets_to_free() {
        let mut scene = controller();
        let mut recorder = Recorder::default();
        let photo = first_of(&scene, ParticleKind::Photo);

        scene.select_particle(photo).expect("select photo");
        run_frames(&mut scene, &mut recorder, 10, 1.0 / 60.0);
        assert_eq!(recorder.overlays, 10);

        scene.request_close_focus();
        scene.request_close_focus();
        for _ in 0..400 {
            scene.render_frame(0, 1.0 / 60.0, &mut recorder);
            if scene.focus().is_none() {
                break;
            }
        }

        assert!(scene.focus().is_none());
        assert_eq!(recorder.count(&SceneEvent::Deselect), 1);
        assert_eq!(scene.camera().mode(), CameraMode::Free);
        assert!(scene.camera().is_resetting());
        assert!(!scene.velocity().is_locked());
    }

    #[test]
    fn hand_selection_holds_and_touch_selection_toggles() {
        let mut hand = controller();
        hand.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::SelectStart]));
        let picked = hand.focused_particle().expect("random pick on miss");
        assert_eq!(
            hand.particles().descriptor(picked).map(|d| d.kind),
            Some(ParticleKind::Photo)
        );
        hand.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::SelectEnd]));
        assert_eq!(hand.focus().map(FocusSession::is_closing), Some(true));

        let mut touch = controller();
        touch.apply_gesture(&gesture(InputSource::Touch, &[DiscreteGesture::SelectStart]));
        touch.apply_gesture(&gesture(InputSource::Touch, &[DiscreteGesture::SelectEnd]));
        assert_eq!(touch.focus().map(FocusSession::is_closing), Some(false));
        touch.apply_gesture(&gesture(InputSource::Touch, &[DiscreteGesture::SelectStart]));
        assert_eq!(touch.focus().map(FocusSession::is_closing), Some(true));
    }

    #[test]
    fn orbit_deltas_feed_velocity_only_when_unfocused() {
        let mut scene = controller();
        let orbit = GestureFrame {
            orbit_delta: Some((0.05, 0.0)),
            mode: InteractionMode::Orbit,
            ..GestureFrame::empty(0, InputSource::Hand)
        };

        scene.apply_gesture(&orbit);
        assert!((scene.velocity().rotation() - 0.05 * -1.8).abs() < 1e-6);

        let photo = first_of(&scene, ParticleKind::Photo);
        scene.select_particle(photo).expect("select photo");
        assert_eq!(scene.velocity().rotation(), 0.0);
        scene.apply_gesture(&orbit);
        assert_eq!(scene.velocity().rotation(), 0.0);
    }

    #[test]
    fn cinematic_plays_message_then_loops_and_blocks_selection() {
        let mut scene = controller();
        let mut recorder = Recorder::default();

        let photo = first_of(&scene, ParticleKind::Photo);
        scene.select_particle(photo).expect("select photo");
        assert!(matches!(
            scene.start_cinematic(),
            Err(SceneError::CinematicRejected(_))
        ));

        let mut scene = controller();
        scene.start_cinematic().expect("start cinematic");
        assert_eq!(scene.camera().mode(), CameraMode::CinematicMessage);
        assert!(matches!(
            scene.select_particle(photo),
            Err(SceneError::SelectionLocked)
        ));
        scene.apply_gesture(&gesture(InputSource::Hand, &[DiscreteGesture::SelectStart]));
        assert!(scene.focus().is_none());

        run_frames(&mut scene, &mut recorder, 150, 0.1);
        assert!(matches!(
            scene.camera().mode(),
            CameraMode::CinematicLooping { .. }
        ));
        assert_eq!(recorder.count(&SceneEvent::CinematicStarted), 1);
        assert_eq!(recorder.count(&SceneEvent::CinematicLooping), 1);
        assert!(recorder
            .events
            .iter()
            .any(|event| matches!(event, SceneEvent::SubtitleChanged(Some(_)))));

        scene.stop_cinematic();
        scene.render_frame(0, 0.1, &mut recorder);
        assert_eq!(scene.camera().mode(), CameraMode::Free);
        assert_eq!(recorder.count(&SceneEvent::CinematicStopped), 1);
        assert!(!scene.velocity().is_locked());
    }

    #[test]
    fn photo_swap_keeps_positions_and_device_switch_regenerates() {
        let mut scene = controller();
        let before: Vec<_> = scene
            .particles()
            .descriptors()
            .iter()
            .map(|descriptor| descriptor.formation)
            .collect();

        let updated = scene.replace_photos(vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert!(updated > 0);
        let after: Vec<_> = scene
            .particles()
            .descriptors()
            .iter()
            .map(|descriptor| descriptor.formation)
            .collect();
        assert_eq!(before, after);
        let photo = first_of(&scene, ParticleKind::Photo);
        assert_eq!(
            scene.particles().descriptor(photo).and_then(|d| d.image_ref.clone()),
            Some("a.jpg".to_string())
        );

        let mut scene = SceneController::new(SceneConfig {
            seed: Some(3),
            ..SceneConfig::default()
        });
        let profile = scene.set_device_class(DeviceClass::Constrained);
        assert_eq!(profile.tree_count, 1_200);
        assert_eq!(scene.particles().len(), 1_200);
    }

    #[test]
    fn stale_detection_samples_are_dropped() {
        let mut scene = controller();
        scene.ingest_hand(&DetectionSample { ts: 500, frame: None });
        let stale = scene.ingest_hand(&DetectionSample { ts: 100, frame: None });
        assert_eq!(stale.ts, 500);
    }

    #[test]
    fn long_press_release_focuses_photo_under_finger() {
        let mut scene = strict_controller();
        let mut recorder = Recorder::default();
        scene.set_viewport(1280.0, 720.0);
        let touch = |x: f32, y: f32| vec![TouchPoint { id: 1, x, y }];

        scene.ingest_touch(&TouchEvent::Start {
            ts: 0,
            touches: touch(640.0, 360.0),
        });
        scene.render_frame(600, 1.0 / 60.0, &mut recorder);
        assert_eq!(recorder.events, vec![SceneEvent::PointerToggle(true)]);

        let (photo, cursor) = hovered_photo(&scene);
        scene.ingest_touch(&TouchEvent::Move {
            ts: 650,
            touches: touch(cursor.x * 1280.0, cursor.y * 720.0),
        });
        scene.ingest_touch(&TouchEvent::End {
            ts: 700,
            touches: Vec::new(),
        });
        assert_eq!(scene.focused_particle(), Some(photo));
        assert!(scene.cursor().is_none());

        // The delayed release does not close a touch selection.
        scene.render_frame(800, 1.0 / 60.0, &mut recorder);
        assert_eq!(scene.focus().map(FocusSession::is_closing), Some(false));
        assert_eq!(
            recorder.events,
            vec![
                SceneEvent::PointerToggle(true),
                SceneEvent::Select(photo),
                SceneEvent::PointerToggle(false),
            ]
        );
    }

    #[test]
    fn long_press_release_over_empty_space_selects_nothing() {
        let mut scene = strict_controller();
        let mut recorder = Recorder::default();
        scene.set_viewport(1280.0, 720.0);
        let corner = vec![TouchPoint { id: 1, x: 2.0, y: 2.0 }];

        scene.ingest_touch(&TouchEvent::Start { ts: 0, touches: corner });
        scene.render_frame(550, 1.0 / 60.0, &mut recorder);
        scene.ingest_touch(&TouchEvent::End {
            ts: 600,
            touches: Vec::new(),
        });
        scene.render_frame(700, 1.0 / 60.0, &mut recorder);

        assert!(scene.focus().is_none());
        assert_eq!(recorder.count(&SceneEvent::PointerToggle(true)), 1);
        assert_eq!(recorder.count(&SceneEvent::PointerToggle(false)), 1);
    }

    #[test]
    fn pointing_pinch_focuses_hovered_photo_and_release_closes() {
        let mut scene = strict_controller();
        let (photo, cursor) = hovered_photo(&scene);
        let mut ts = 0;

        let mut toggles = Vec::new();
        for _ in 0..8 {
            ts += 33;
            let out = hand_at(&mut scene, HandPose::Pointing, cursor, ts);
            toggles.extend(out.pointer_toggle);
        }
        assert_eq!(toggles, vec![true]);
        assert_eq!(scene.interaction_mode(), InteractionMode::Pointer);
        let seen = scene.cursor().expect("cursor while pointing");
        assert!((seen.x - cursor.x).abs() < 1e-4 && (seen.y - cursor.y).abs() < 1e-4);

        for _ in 0..5 {
            ts += 33;
            hand_at(&mut scene, HandPose::PointingPinch, cursor, ts);
        }
        assert_eq!(scene.focused_particle(), Some(photo));
        assert_eq!(scene.focus().map(FocusSession::is_closing), Some(false));

        for _ in 0..5 {
            ts += 33;
            hand_at(&mut scene, HandPose::Pointing, cursor, ts);
        }
        assert_eq!(scene.focus().map(FocusSession::is_closing), Some(true));
    }

    #[test]
    fn release_input_ends_active_pointer_once() {
        let mut scene = controller();
        let mut recorder = Recorder::default();
        let cursor = CursorPos { x: 0.5, y: 0.5 };
        for frame in 1..=8 {
            hand_at(&mut scene, HandPose::Pointing, cursor, frame * 33);
        }
        assert!(scene.cursor().is_some());

        scene.release_input(300);
        scene.render_frame(300, 1.0 / 60.0, &mut recorder);
        assert!(scene.cursor().is_none());
        assert_eq!(scene.interaction_mode(), InteractionMode::Idle);

        scene.release_input(320);
        scene.render_frame(320, 1.0 / 60.0, &mut recorder);
        assert_eq!(recorder.count(&SceneEvent::PointerToggle(true)), 1);
        assert_eq!(recorder.count(&SceneEvent::PointerToggle(false)), 1);
    }

    #[test]
    fn failed_image_load_shows_placeholder_footprint() {
        let mut scene = controller();
        let photo = first_of(&scene, ParticleKind::Photo);
        scene.select_particle(photo).expect("select photo");
        let pending = scene.focus().map(|session| session.footprint().clone());

        scene.set_image_load(photo + 1, &ImageLoad::Failed("404".to_string()));
        assert_eq!(scene.focus().map(|session| session.footprint().clone()), pending);

        let failed = ImageLoad::Failed("404".to_string());
        scene.set_image_load(photo, &failed);
        let expected = ImageFootprint::from_load(&failed, &scene.config().focus);
        assert!(expected.placeholder_color.is_some());
        assert_eq!(scene.focus().map(FocusSession::footprint), Some(&expected));
    }

    #[test]
    fn device_switch_while_closing_reports_single_deselect() {
        let mut scene = controller();
        let mut recorder = Recorder::default();
        let photo = first_of(&scene, ParticleKind::Photo);

        scene.select_particle(photo).expect("select photo");
        scene.render_frame(0, 1.0 / 60.0, &mut recorder);
        scene.request_close_focus();
        scene.set_device_class(DeviceClass::Constrained);
        scene.render_frame(16, 1.0 / 60.0, &mut recorder);

        assert!(scene.focus().is_none());
        assert_eq!(recorder.count(&SceneEvent::Deselect), 1);
        assert_eq!(scene.camera().mode(), CameraMode::Free);
    }

    #[test]
    fn device_switch_while_focused_deselects() {
        let mut scene = controller();
        let mut recorder = Recorder::default();
        let photo = first_of(&scene, ParticleKind::Photo);

        scene.select_particle(photo).expect("select photo");
        scene.set_device_class(DeviceClass::Constrained);
        scene.render_frame(0, 1.0 / 60.0, &mut recorder);

        assert!(scene.focus().is_none());
        assert_eq!(recorder.count(&SceneEvent::Deselect), 1);
    }

    #[test]
    fn external_camera_pose_is_ignored_while_focused() {
        let mut scene = controller();
        let closer = CameraPose::new(Vec3::new(0.0, 8.0, 20.0), Vec3::new(0.0, 7.5, 0.0));
        assert!(scene.set_camera_pose(closer));
        assert_eq!(scene.camera().pose(), closer);

        let photo = first_of(&scene, ParticleKind::Photo);
        scene.select_particle(photo).expect("select photo");
        let farther = CameraPose::new(Vec3::new(0.0, 8.0, 40.0), Vec3::new(0.0, 7.5, 0.0));
        assert!(!scene.set_camera_pose(farther));
        assert_eq!(scene.camera().pose(), closer);
    }
}
