//! Detection loop.
//!
//! Detection runs on its own periodic task and hands samples to the render
//! side through a channel, so rendering never waits on the tracker. Constrained
//! devices skip detection ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::state::TrackerResource;
use crate::models::events::LandmarkFrame;

/// Milliseconds since scene start; shared by detection and rendering.
#[derive(Debug, Clone, Copy)]
pub struct SceneClock {
    start: Instant,
}

impl SceneClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Runs detection on every n-th tick.
#[derive(Debug, Clone)]
pub struct DetectionScheduler {
    frame_skip: u32,
    ticks: u64,
}

impl DetectionScheduler {
    pub fn new(frame_skip: u32) -> Self {
        Self {
            frame_skip: frame_skip.max(1),
            ticks: 0,
        }
    }

    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    pub fn should_detect(&mut self) -> bool {
        let due = self.ticks % self.frame_skip as u64 == 0;
        self.ticks = self.ticks.wrapping_add(1);
        due
    }
}

/// One detection result. `frame: None` means no usable hand this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSample {
    pub ts: u64,
    pub frame: Option<LandmarkFrame>,
}

pub struct DetectionTask {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    samples: mpsc::UnboundedReceiver<DetectionSample>,
}

impl DetectionTask {
    /// Spawns the periodic detection task on the current tokio runtime.
    pub fn spawn(
        tracker: TrackerResource,
        clock: SceneClock,
        interval: Duration,
        frame_skip: u32,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let task_stop = stop_flag.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut scheduler = DetectionScheduler::new(frame_skip);

            loop {
                ticker.tick().await;
                if task_stop.load(Ordering::SeqCst) {
                    break;
                }
                if !scheduler.should_detect() {
                    continue;
                }

                let ts = clock.now_ms();
                let frame = match tracker.detect(ts).await {
                    Ok(frame) => frame,
                    Err(err) => {
                        log::warn!("detection_tick: ts={} error={}", ts, err);
                        None
                    }
                };
                if task_stop.load(Ordering::SeqCst) || tx.send(DetectionSample { ts, frame }).is_err() {
                    break;
                }
            }
            log::debug!("detection_task: stopped");
        });

        log::info!(
            "detection_task: started interval={:?} frame_skip={}",
            interval,
            frame_skip.max(1)
        );

        Self {
            stop_flag,
            handle: Some(handle),
            samples: rx,
        }
    }

    /// Every sample produced since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<DetectionSample> {
        let mut samples = Vec::new();
        while let Ok(sample) = self.samples.try_recv() {
            samples.push(sample);
        }
        samples
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the task without waiting; no sample is produced afterwards.
    pub fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("detection_task: shutdown requested");
        }
        self.samples.close();
    }
}

impl Drop for DetectionTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}
