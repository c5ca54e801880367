//! Hand tracker resource.
//!
//! The tracking model is expensive to load and owns the camera device, so it
//! lives behind a single resource that loads lazily, shares one in-flight load
//! between concurrent callers and is torn down explicitly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use crate::error::TrackerError;
use crate::models::events::LandmarkFrame;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// A loaded hand tracker bound to a camera device.
pub trait HandTracker: Send {
    /// Runs detection on the newest camera frame. `Ok(None)`: no hand visible.
    fn detect(&mut self, now_ms: u64) -> Result<Option<LandmarkFrame>, TrackerError>;

    /// Releases the camera device.
    fn close(&mut self);
}

pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Box<dyn HandTracker>, TrackerError>> + Send + 'a>>;

/// Loads the tracking model and opens the camera.
pub trait TrackerLoader: Send + Sync {
    fn load(&self) -> LoadFuture<'_>;
}

#[derive(Default)]
struct TrackerSlot {
    tracker: Option<Box<dyn HandTracker>>,
    last_error: Option<TrackerError>,
}

/// Shared handle; clones refer to the same tracker.
#[derive(Clone)]
pub struct TrackerResource {
    loader: Arc<dyn TrackerLoader>,
    slot: Arc<Mutex<TrackerSlot>>,
    status_tx: Arc<watch::Sender<TrackerStatus>>,
    status_rx: watch::Receiver<TrackerStatus>,
}

impl TrackerResource {
    pub fn new(loader: Arc<dyn TrackerLoader>) -> Self {
        let (status_tx, status_rx) = watch::channel(TrackerStatus::Uninitialized);
        Self {
            loader,
            slot: Arc::new(Mutex::new(TrackerSlot::default())),
            status_tx: Arc::new(status_tx),
            status_rx,
        }
    }

    pub fn status(&self) -> TrackerStatus {
        *self.status_rx.borrow()
    }

    /// Status updates for observers (HUD, logs).
    pub fn subscribe(&self) -> watch::Receiver<TrackerStatus> {
        self.status_rx.clone()
    }

    /// Loads the tracker once. Concurrent callers wait on the same load; a
    /// failure is cached until [`TrackerResource::reset`].
    pub async fn acquire(&self) -> Result<(), TrackerError> {
        let mut slot = self.slot.lock().await;

        match self.status() {
            TrackerStatus::Ready => return Ok(()),
            TrackerStatus::Failed => {
                return Err(slot
                    .last_error
                    .clone()
                    .unwrap_or_else(|| TrackerError::Load("unknown".to_string())));
            }
            TrackerStatus::Uninitialized | TrackerStatus::Initializing => {}
        }

        self.set_status(TrackerStatus::Initializing);
        log::info!("tracker_acquire: loading hand tracker");

        match self.loader.load().await {
            Ok(tracker) => {
                slot.tracker = Some(tracker);
                slot.last_error = None;
                self.set_status(TrackerStatus::Ready);
                log::info!("tracker_acquire: ready");
                Ok(())
            }
            Err(err) => {
                log::warn!("tracker_acquire: failed: {}", err);
                slot.last_error = Some(err.clone());
                self.set_status(TrackerStatus::Failed);
                Err(err)
            }
        }
    }

    pub async fn detect(&self, now_ms: u64) -> Result<Option<LandmarkFrame>, TrackerError> {
        let mut slot = self.slot.lock().await;
        match slot.tracker.as_mut() {
            Some(tracker) => tracker.detect(now_ms),
            None => Err(TrackerError::TornDown),
        }
    }

    /// Clears a cached failure so the next `acquire` retries.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        if self.status() == TrackerStatus::Failed {
            slot.last_error = None;
            self.set_status(TrackerStatus::Uninitialized);
            log::info!("tracker_reset: failure cleared");
        }
    }

    /// Closes the camera device. Safe to call repeatedly; the device is
    /// closed at most once per successful load.
    pub async fn teardown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(mut tracker) = slot.tracker.take() {
            tracker.close();
            log::info!("tracker_teardown: device released");
        }
        slot.last_error = None;
        self.set_status(TrackerStatus::Uninitialized);
    }

    fn set_status(&self, next: TrackerStatus) {
        self.status_tx.send_replace(next);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Tracker that reports nothing and counts calls.
    pub(crate) struct CountingTracker {
        pub detections: Arc<AtomicUsize>,
        pub closes: Arc<AtomicUsize>,
    }

    impl HandTracker for CountingTracker {
        fn detect(&mut self, _now_ms: u64) -> Result<Option<LandmarkFrame>, TrackerError> {
            self.detections.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingLoader {
        pub loads: Arc<AtomicUsize>,
        pub detections: Arc<AtomicUsize>,
        pub closes: Arc<AtomicUsize>,
        pub fail: AtomicBool,
    }

    impl TrackerLoader for CountingLoader {
        fn load(&self) -> LoadFuture<'_> {
            Box::pin(async move {
                self.loads.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.fail.load(Ordering::SeqCst) {
                    return Err(TrackerError::DeviceUnavailable("camera denied".to_string()));
                }
                Ok(Box::new(CountingTracker {
                    detections: self.detections.clone(),
                    closes: self.closes.clone(),
                }) as Box<dyn HandTracker>)
            })
        }
    }

    #[tokio::test]
    async fn concurrent_acquire_shares_one_load() {
        let loader = Arc::new(CountingLoader::default());
        let resource = TrackerResource::new(loader.clone());

        let first = resource.clone();
        let second = resource.clone();
        let (a, b) = tokio::join!(first.acquire(), second.acquire());

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(resource.status(), TrackerStatus::Ready);
    }

    #[tokio::test]
    async fn failure_is_cached_until_reset() {
        let loader = Arc::new(CountingLoader::default());
        loader.fail.store(true, Ordering::SeqCst);
        let resource = TrackerResource::new(loader.clone());

        assert!(resource.acquire().await.is_err());
        assert_eq!(resource.status(), TrackerStatus::Failed);
        assert!(matches!(
            resource.acquire().await,
            Err(TrackerError::DeviceUnavailable(_))
        ));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        loader.fail.store(false, Ordering::SeqCst);
        resource.reset().await;
        assert_eq!(resource.status(), TrackerStatus::Uninitialized);
        resource.acquire().await.expect("retry succeeds");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn teardown_closes_device_once_and_detect_reports_it() {
        let loader = Arc::new(CountingLoader::default());
        let resource = TrackerResource::new(loader.clone());
        resource.acquire().await.expect("acquire");
        assert!(resource.detect(0).await.expect("detect").is_none());

        resource.teardown().await;
        resource.teardown().await;
        assert_eq!(loader.closes.load(Ordering::SeqCst), 1);
        assert_eq!(resource.status(), TrackerStatus::Uninitialized);
        assert!(matches!(
            resource.detect(1).await,
            Err(TrackerError::TornDown)
        ));
    }
}
